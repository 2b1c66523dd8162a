use super::*;
use crate::classify::ErrorCategory;
use crate::error::ProviderErrorKind;
use crate::providers::{FallbackAnswer, PrimaryResponse};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::AtomicUsize;
use tokio::sync::Notify;

/// Primary provider scripted with a fixed outcome
struct ScriptedPrimary {
    outcome: PrimaryOutcome,
    calls: AtomicUsize,
    /// When set, `search`/`health_news` signal `started` and then wait on
    /// `gate` before answering — lets a test observe an in-flight resolution
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

enum PrimaryOutcome {
    Answer(Value),
    Fail(ProviderErrorKind),
}

impl ScriptedPrimary {
    fn answering(raw: Value) -> Arc<Self> {
        Arc::new(Self {
            outcome: PrimaryOutcome::Answer(raw),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    fn failing(kind: ProviderErrorKind) -> Arc<Self> {
        Arc::new(Self {
            outcome: PrimaryOutcome::Fail(kind),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    fn gated(raw: Value, started: Arc<Notify>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            outcome: PrimaryOutcome::Answer(raw),
            calls: AtomicUsize::new(0),
            gate: Some((started, gate)),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> std::result::Result<PrimaryResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((started, gate)) = &self.gate {
            started.notify_one();
            gate.notified().await;
        }
        match &self.outcome {
            PrimaryOutcome::Answer(raw) => Ok(PrimaryResponse { raw: raw.clone() }),
            PrimaryOutcome::Fail(kind) => Err(ProviderError::new(*kind, "scripted failure")),
        }
    }
}

#[async_trait]
impl PrimaryProvider for ScriptedPrimary {
    async fn search(&self, _query: &str) -> std::result::Result<PrimaryResponse, ProviderError> {
        self.answer().await
    }

    async fn health_news(
        &self,
        _categories: &[String],
        _limit: usize,
    ) -> std::result::Result<PrimaryResponse, ProviderError> {
        self.answer().await
    }

    fn format_response(&self, raw: &Value) -> String {
        format!(
            "formatted: {}",
            raw.get("text").and_then(Value::as_str).unwrap_or("")
        )
    }

    fn extract_citations(&self, raw: &Value) -> Vec<String> {
        raw.get("citations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn extract_recommendations(&self, raw: &Value) -> Vec<String> {
        raw.get("recommendations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Fallback provider scripted with a fixed outcome
struct ScriptedFallback {
    name: &'static str,
    source: DataSource,
    serves_news: bool,
    outcome: std::result::Result<String, ProviderErrorKind>,
    disclaimer: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedFallback {
    fn news(outcome: std::result::Result<String, ProviderErrorKind>) -> Arc<Self> {
        Arc::new(Self {
            name: "news-feed",
            source: DataSource::OpenAi,
            serves_news: true,
            outcome,
            disclaimer: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn nutrition(outcome: std::result::Result<String, ProviderErrorKind>) -> Arc<Self> {
        Arc::new(Self {
            name: "vnutrition",
            source: DataSource::VNutrition,
            serves_news: false,
            outcome,
            disclaimer: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FallbackProvider for ScriptedFallback {
    fn name(&self) -> &'static str {
        self.name
    }

    fn data_source(&self) -> DataSource {
        self.source
    }

    fn handles(&self, kind: &RequestKind) -> bool {
        match kind {
            RequestKind::News { .. } => self.serves_news,
            RequestKind::Text => !self.serves_news,
        }
    }

    async fn fetch(
        &self,
        _request: &SearchRequest,
    ) -> std::result::Result<FallbackAnswer, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(text) => Ok(FallbackAnswer {
                display_text: text.clone(),
                disclaimer: self.disclaimer.clone(),
                raw_response: None,
            }),
            Err(kind) => Err(ProviderError::new(*kind, "scripted fallback failure")),
        }
    }
}

fn resolver_with(
    primary: Arc<ScriptedPrimary>,
    fallbacks: Vec<Arc<ScriptedFallback>>,
) -> SearchResolver {
    let fallbacks: Vec<Arc<dyn FallbackProvider>> = fallbacks
        .into_iter()
        .map(|f| f as Arc<dyn FallbackProvider>)
        .collect();
    SearchResolver::with_providers(
        ResolverConfig::default(),
        Arc::new(ResultCache::new()),
        primary,
        fallbacks,
    )
}

#[tokio::test]
async fn navigation_result_is_returned_verbatim_without_provider_calls() {
    let primary = ScriptedPrimary::answering(json!({ "text": "unused" }));
    let resolver = resolver_with(Arc::clone(&primary), vec![]);

    let request = SearchRequest::text("anything").with_navigation_result(
        crate::types::NavigationResult {
            display_text: "precomputed answer".to_string(),
            data_source: Some(DataSource::Local),
            citations: vec!["NIH".to_string()],
            ..Default::default()
        },
    );

    let result = resolver.resolve(request).await.into_result().unwrap();
    assert_eq!(result.display_text, "precomputed answer");
    assert_eq!(result.data_source, DataSource::Local);
    assert_eq!(result.citations, vec!["NIH".to_string()]);

    assert_eq!(primary.calls(), 0, "no provider may be invoked");
    assert!(resolver.cache().is_empty(), "cache must not be mutated");
}

#[tokio::test]
async fn navigation_result_without_tag_defaults_to_wihy() {
    let primary = ScriptedPrimary::answering(json!({}));
    let resolver = resolver_with(primary, vec![]);

    let request = SearchRequest::text("anything")
        .with_navigation_result(crate::types::NavigationResult {
            display_text: "handed over".to_string(),
            ..Default::default()
        });

    let result = resolver.resolve(request).await.into_result().unwrap();
    assert_eq!(result.data_source, DataSource::Wihy);
}

#[tokio::test]
async fn cache_hit_is_served_as_local_without_network() {
    let primary = ScriptedPrimary::answering(json!({ "text": "fresh" }));
    let resolver = resolver_with(Arc::clone(&primary), vec![]);

    resolver.cache().set(
        "health_news_all",
        "# Latest Health News\n\n...",
        "news-feed",
    );

    let result = resolver
        .resolve(SearchRequest::news("all"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.display_text, "# Latest Health News\n\n...");
    assert_eq!(result.data_source, DataSource::Local);
    assert_eq!(primary.calls(), 0, "cache hit must skip all network activity");
}

#[tokio::test]
async fn primary_success_tags_wihy_and_caches_formatted_text() {
    let primary = ScriptedPrimary::answering(json!({
        "text": "Quinoa is a whole grain.",
        "citations": ["NIH Guidelines"],
        "recommendations": ["Rinse before cooking"],
        "session_id": "sess-7",
    }));
    let resolver = resolver_with(Arc::clone(&primary), vec![]);

    let result = resolver
        .resolve(SearchRequest::text("is quinoa healthy?"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.data_source, DataSource::Wihy);
    assert_eq!(result.display_text, "formatted: Quinoa is a whole grain.");
    assert_eq!(result.citations, vec!["NIH Guidelines".to_string()]);
    assert_eq!(result.recommendations, vec!["Rinse before cooking".to_string()]);
    assert_eq!(result.session_id, Some("sess-7".to_string()));
    assert!(result.disclaimer.contains("healthcare professionals"));

    let cached = resolver.cache().get("is quinoa healthy?").unwrap();
    assert_eq!(cached.payload, result.display_text);
    assert_eq!(cached.source_ref, "wihy");
}

#[tokio::test]
async fn duplicate_key_while_pending_returns_in_flight() {
    let started = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let primary = ScriptedPrimary::gated(
        json!({ "text": "slow answer" }),
        Arc::clone(&started),
        Arc::clone(&gate),
    );
    let resolver = Arc::new(resolver_with(Arc::clone(&primary), vec![]));

    let first = {
        let resolver = Arc::clone(&resolver);
        tokio::spawn(async move { resolver.resolve(SearchRequest::text("slow query")).await })
    };

    // Wait until the first resolution reached the primary provider
    started.notified().await;

    let second = resolver.resolve(SearchRequest::text("slow query")).await;
    assert!(second.is_in_flight(), "second call must be a no-op");

    gate.notify_one();
    let first = first.await.unwrap().into_result().unwrap();
    assert_eq!(first.data_source, DataSource::Wihy);
    assert_eq!(primary.calls(), 1, "no duplicate fetch may be triggered");
}

#[tokio::test]
async fn repeated_key_after_completion_is_skipped_until_reset() {
    let primary = ScriptedPrimary::answering(json!({ "text": "answer" }));
    let resolver = resolver_with(Arc::clone(&primary), vec![]);

    let first = resolver.resolve(SearchRequest::text("kale")).await;
    assert!(!first.is_in_flight());

    // The last started key is retained across completion
    let second = resolver.resolve(SearchRequest::text("kale")).await;
    assert!(second.is_in_flight());

    resolver.reset();
    let third = resolver.resolve(SearchRequest::text("kale")).await;
    let third = third.into_result().unwrap();
    assert_eq!(third.data_source, DataSource::Local, "retry hits the cache");
}

#[tokio::test]
async fn primary_failure_falls_back_to_news_feed() {
    let digest = "# Latest Health News\n\n## Study\n\n---\n\n".to_string();
    let primary = ScriptedPrimary::failing(ProviderErrorKind::Unavailable);
    let news = ScriptedFallback::news(Ok(digest.clone()));
    let resolver = resolver_with(Arc::clone(&primary), vec![Arc::clone(&news)]);

    let result = resolver
        .resolve(SearchRequest::news("all"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.data_source, DataSource::OpenAi);
    assert_eq!(result.display_text, digest);
    assert!(result.disclaimer.contains("Health news provided by AI"));
    assert_eq!(news.calls(), 1);

    let cached = resolver.cache().get("health_news_all").unwrap();
    assert_eq!(cached.payload, digest);
    assert_eq!(cached.source_ref, "news-feed");
}

#[tokio::test]
async fn exhausted_structured_failures_yield_general_error() {
    // Primary reports a plain structured failure; nutrition lookup answers
    // 200 with found=false, which its client reports as unavailable
    let primary = ScriptedPrimary::failing(ProviderErrorKind::Unavailable);
    let nutrition = ScriptedFallback::nutrition(Err(ProviderErrorKind::Unavailable));
    let resolver = resolver_with(primary, vec![Arc::clone(&nutrition)]);

    let result = resolver
        .resolve(SearchRequest::text("unobtainium berries"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.data_source, DataSource::Error);
    assert_eq!(result.display_text, ErrorCategory::General.message());
    assert!(result.citations.is_empty());
    assert!(result.recommendations.is_empty());
    assert!(result.disclaimer.contains("contact support"));
    assert_eq!(nutrition.calls(), 1);
    assert!(
        resolver.cache().get("unobtainium berries").is_none(),
        "failures are never cached"
    );
}

#[tokio::test]
async fn network_primary_failure_yields_connectivity_template() {
    let primary = ScriptedPrimary::failing(ProviderErrorKind::Network);
    let nutrition = ScriptedFallback::nutrition(Err(ProviderErrorKind::Unavailable));
    let resolver = resolver_with(primary, vec![nutrition]);

    let result = resolver
        .resolve(SearchRequest::text("anything"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.data_source, DataSource::Error);
    assert!(
        result
            .display_text
            .starts_with(ErrorCategory::Connectivity.message()),
        "connectivity template must win over the default one"
    );
}

#[tokio::test]
async fn fallback_chain_is_ordered_and_short_circuits() {
    let primary = ScriptedPrimary::failing(ProviderErrorKind::Unavailable);
    let first = ScriptedFallback::nutrition(Err(ProviderErrorKind::Transport));
    let second = Arc::new(ScriptedFallback {
        name: "nutrition-mirror",
        source: DataSource::VNutrition,
        serves_news: false,
        outcome: Ok("{\"found\":true}".to_string()),
        disclaimer: None,
        calls: AtomicUsize::new(0),
    });
    let third = ScriptedFallback::nutrition(Ok("never reached".to_string()));

    let resolver = resolver_with(
        primary,
        vec![Arc::clone(&first), Arc::clone(&second), Arc::clone(&third)],
    );

    let result = resolver
        .resolve(SearchRequest::text("quinoa"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.data_source, DataSource::VNutrition);
    assert_eq!(result.display_text, "{\"found\":true}");
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(third.calls(), 0, "chain short-circuits on first success");

    let cached = resolver.cache().get("quinoa").unwrap();
    assert_eq!(cached.source_ref, "nutrition-mirror");
}

#[tokio::test]
async fn empty_fallback_disclaimer_suppresses_the_default() {
    let primary = ScriptedPrimary::failing(ProviderErrorKind::Unavailable);
    let nutrition = Arc::new(ScriptedFallback {
        name: "vnutrition",
        source: DataSource::VNutrition,
        serves_news: false,
        outcome: Ok("{\"found\":true}".to_string()),
        disclaimer: Some(String::new()),
        calls: AtomicUsize::new(0),
    });
    let resolver = resolver_with(primary, vec![nutrition]);

    let result = resolver
        .resolve(SearchRequest::text("quinoa"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.data_source, DataSource::VNutrition);
    assert!(
        result.disclaimer.is_empty(),
        "an empty override must not fall back to the health default"
    );
}

#[tokio::test]
async fn fallback_not_handling_the_kind_is_skipped() {
    let primary = ScriptedPrimary::failing(ProviderErrorKind::Unavailable);
    let news = ScriptedFallback::news(Ok("digest".to_string()));
    let nutrition = ScriptedFallback::nutrition(Ok("{\"found\":true}".to_string()));
    let resolver = resolver_with(primary, vec![Arc::clone(&news), Arc::clone(&nutrition)]);

    let result = resolver
        .resolve(SearchRequest::text("quinoa"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.data_source, DataSource::VNutrition);
    assert_eq!(news.calls(), 0, "news fallback only serves category requests");
    assert_eq!(nutrition.calls(), 1);
}

#[tokio::test]
async fn history_navigation_without_cache_returns_placeholder() {
    let primary = ScriptedPrimary::answering(json!({ "text": "unused" }));
    let resolver = resolver_with(Arc::clone(&primary), vec![]);

    let request =
        SearchRequest::text("old query").with_origin(RequestOrigin::HistoryNavigation);
    let result = resolver.resolve(request).await.into_result().unwrap();

    assert_eq!(result.data_source, DataSource::Local);
    assert_eq!(
        result.display_text,
        ResolverConfig::default().new_search_prompt
    );
    assert_eq!(primary.calls(), 0, "back/forward must never trigger a fetch");
}

#[tokio::test]
async fn history_navigation_with_cache_still_serves_the_cache() {
    let primary = ScriptedPrimary::answering(json!({ "text": "unused" }));
    let resolver = resolver_with(Arc::clone(&primary), vec![]);
    resolver.cache().set("old query", "cached answer", "wihy");

    let request =
        SearchRequest::text("old query").with_origin(RequestOrigin::HistoryNavigation);
    let result = resolver.resolve(request).await.into_result().unwrap();

    assert_eq!(result.display_text, "cached answer");
    assert_eq!(result.data_source, DataSource::Local);
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn revisit_fetches_only_on_the_first_resolution() {
    let primary = ScriptedPrimary::answering(json!({ "text": "fresh" }));
    let resolver = resolver_with(Arc::clone(&primary), vec![]);

    // First revisit on a fresh resolver is a genuine initial load
    let first = resolver
        .resolve(SearchRequest::text("first").with_origin(RequestOrigin::Revisit))
        .await
        .into_result()
        .unwrap();
    assert_eq!(first.data_source, DataSource::Wihy);
    assert_eq!(primary.calls(), 1);

    // A later revisit with a cache miss gets the placeholder instead
    let second = resolver
        .resolve(SearchRequest::text("second").with_origin(RequestOrigin::Revisit))
        .await
        .into_result()
        .unwrap();
    assert_eq!(second.data_source, DataSource::Local);
    assert_eq!(
        second.display_text,
        ResolverConfig::default().new_search_prompt
    );
    assert_eq!(primary.calls(), 1, "revisit after completion must not fetch");

    // An explicit new search still goes to the network
    let third = resolver
        .resolve(SearchRequest::text("third"))
        .await
        .into_result()
        .unwrap();
    assert_eq!(third.data_source, DataSource::Wihy);
    assert_eq!(primary.calls(), 2);
}

#[tokio::test]
async fn guard_is_released_after_error_results() {
    let primary = ScriptedPrimary::failing(ProviderErrorKind::Server);
    let resolver = resolver_with(primary, vec![]);

    let first = resolver
        .resolve(SearchRequest::text("failing"))
        .await
        .into_result()
        .unwrap();
    assert_eq!(first.data_source, DataSource::Error);

    // The in-flight flag was cleared; a different key proceeds normally
    let second = resolver.resolve(SearchRequest::text("other")).await;
    assert!(!second.is_in_flight());
}
