//! Query resolution coordinator
//!
//! [`SearchResolver`] turns a [`SearchRequest`] into a displayable
//! [`ResolvedResult`] by consulting, in strict priority order:
//!
//! 1. a result handed over from a prior screen (navigation state),
//! 2. the local result cache,
//! 3. the primary unified backend,
//! 4. an ordered chain of fallback providers.
//!
//! `resolve()` never returns an error: when every source fails, the pair of
//! tagged failures is classified into one of five fixed user-facing messages
//! and returned as an error-tagged result. A single-flight guard serializes
//! resolutions per resolver instance, and every freshly fetched success is
//! written back to the cache before it is returned.

use crate::cache::ResultCache;
use crate::classify::classify;
use crate::config::ResolverConfig;
use crate::error::{ProviderError, Result};
use crate::guard::SingleFlight;
use crate::providers::{
    FallbackProvider, NewsFeedClient, NutritionClient, PrimaryProvider, WihyClient,
};
use crate::types::{DataSource, RequestKind, RequestOrigin, ResolvedResult, SearchRequest};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Outcome of a call to [`SearchResolver::resolve`]
#[must_use]
#[derive(Clone, Debug)]
pub enum Resolution {
    /// The request was resolved (possibly to an error-tagged result)
    Resolved(ResolvedResult),
    /// A resolution for this key is already handled or in progress; the
    /// caller should not surface a new loading state
    InFlight,
}

impl Resolution {
    /// The resolved result, if this call produced one
    pub fn into_result(self) -> Option<ResolvedResult> {
        match self {
            Resolution::Resolved(result) => Some(result),
            Resolution::InFlight => None,
        }
    }

    /// True when the call was skipped because a resolution was already
    /// handled or in progress
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Resolution::InFlight)
    }
}

/// The query resolution coordinator
///
/// Owns the single-flight guard and walks the fixed decision sequence over
/// injected providers. Cheap to share behind an [`Arc`]; all methods take
/// `&self`.
pub struct SearchResolver {
    config: ResolverConfig,
    cache: Arc<ResultCache>,
    primary: Arc<dyn PrimaryProvider>,
    fallbacks: Vec<Arc<dyn FallbackProvider>>,
    guard: SingleFlight,
    completed_once: AtomicBool,
}

impl SearchResolver {
    /// Create a resolver with the bundled HTTP providers
    ///
    /// Wires a [`WihyClient`] primary and the standard fallback chain
    /// (news feed for category requests, nutrition lookup for free text)
    /// over a fresh empty cache.
    ///
    /// # Errors
    /// Returns error if an HTTP client cannot be created
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let primary: Arc<dyn PrimaryProvider> = Arc::new(WihyClient::new(&config)?);
        let fallbacks: Vec<Arc<dyn FallbackProvider>> = vec![
            Arc::new(NewsFeedClient::new(&config)?),
            Arc::new(NutritionClient::new(&config)?),
        ];
        Ok(Self::with_providers(
            config,
            Arc::new(ResultCache::new()),
            primary,
            fallbacks,
        ))
    }

    /// Create a resolver over injected providers and a shared cache
    ///
    /// The fallback chain is attempted in the order given; only providers
    /// whose `handles()` accepts the request kind are consulted.
    pub fn with_providers(
        config: ResolverConfig,
        cache: Arc<ResultCache>,
        primary: Arc<dyn PrimaryProvider>,
        fallbacks: Vec<Arc<dyn FallbackProvider>>,
    ) -> Self {
        Self {
            config,
            cache,
            primary,
            fallbacks,
            guard: SingleFlight::new(),
            completed_once: AtomicBool::new(false),
        }
    }

    /// The cache shared by this resolver
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Forget the in-flight state and the last resolved key
    ///
    /// The guard deliberately refuses to re-run the key of the previous
    /// resolution even after it completed; callers implementing an explicit
    /// "search again" action call this first.
    pub fn reset(&self) {
        self.guard.reset();
    }

    /// Resolve a request into a displayable result
    ///
    /// Never returns an error; every failure path is converted into an
    /// error-tagged [`ResolvedResult`]. Returns [`Resolution::InFlight`]
    /// when another resolution is executing or the key matches the previous
    /// resolution.
    pub async fn resolve(&self, request: SearchRequest) -> Resolution {
        // A handed-over result wins over everything, cache included: it may
        // represent fresher, user-specific state. It bypasses the guard and
        // never touches the cache.
        if let Some(nav) = request.navigation_result {
            debug!("serving navigation-state result");
            return Resolution::Resolved(nav.into());
        }

        let key = request.cache_key();

        let permit = match self.guard.begin(&key) {
            Some(permit) => permit,
            None => {
                debug!(key, "resolution already handled or in progress");
                return Resolution::InFlight;
            }
        };

        if let Some(entry) = self.cache.get(&key) {
            info!(key, source_ref = %entry.source_ref, "serving cached result");
            self.completed_once.store(true, Ordering::SeqCst);
            drop(permit);
            return Resolution::Resolved(ResolvedResult::plain(entry.payload, DataSource::Local));
        }

        // No cached result: refuse to issue a surprise background fetch when
        // the user merely navigated back to a results view.
        let revisit_after_completion = request.origin == RequestOrigin::Revisit
            && self.completed_once.load(Ordering::SeqCst);
        if request.origin == RequestOrigin::HistoryNavigation || revisit_after_completion {
            debug!(key, origin = ?request.origin, "navigation without cache, skipping fetch");
            drop(permit);
            return Resolution::Resolved(ResolvedResult::plain(
                self.config.new_search_prompt.clone(),
                DataSource::Local,
            ));
        }

        let result = self.fetch(&request, &key).await;
        self.completed_once.store(true, Ordering::SeqCst);
        drop(permit);
        Resolution::Resolved(result)
    }

    /// Primary fetch, fallback chain, then error classification
    async fn fetch(&self, request: &SearchRequest, key: &str) -> ResolvedResult {
        let primary_err = match self.fetch_primary(request, key).await {
            Ok(result) => return result,
            Err(e) => e,
        };
        warn!(key, error = %primary_err, "primary provider failed, trying fallback chain");

        let mut last_fallback_err: Option<ProviderError> = None;
        for fallback in self.fallbacks.iter().filter(|f| f.handles(&request.kind)) {
            match fallback.fetch(request).await {
                Ok(answer) => {
                    info!(key, provider = fallback.name(), "fallback provider answered");
                    self.cache.set(key, answer.display_text.clone(), fallback.name());
                    let disclaimer = answer
                        .disclaimer
                        .unwrap_or_else(|| self.disclaimer_for(&request.kind));
                    return ResolvedResult {
                        display_text: answer.display_text,
                        data_source: fallback.data_source(),
                        citations: Vec::new(),
                        recommendations: Vec::new(),
                        disclaimer,
                        raw_response: answer.raw_response,
                        session_id: None,
                    };
                }
                Err(e) => {
                    warn!(key, provider = fallback.name(), error = %e, "fallback provider failed");
                    last_fallback_err = Some(e);
                }
            }
        }

        let category = classify(&primary_err, last_fallback_err.as_ref());
        error!(key, ?category, "all providers exhausted");
        ResolvedResult {
            display_text: category.message().to_string(),
            data_source: DataSource::Error,
            citations: Vec::new(),
            recommendations: Vec::new(),
            disclaimer: self.config.error_disclaimer.clone(),
            raw_response: None,
            session_id: None,
        }
    }

    /// Fetch from the primary provider and assemble the result
    async fn fetch_primary(
        &self,
        request: &SearchRequest,
        key: &str,
    ) -> std::result::Result<ResolvedResult, ProviderError> {
        let response = match &request.kind {
            RequestKind::Text => self.primary.search(&request.query).await?,
            RequestKind::News { category } => {
                self.primary
                    .health_news(std::slice::from_ref(category), self.config.news_limit)
                    .await?
            }
        };

        let display_text = self.primary.format_response(&response.raw);
        let citations = self.primary.extract_citations(&response.raw);
        let recommendations = self.primary.extract_recommendations(&response.raw);
        let session_id = response.session_id();

        self.cache.set(key, display_text.clone(), "wihy");
        info!(key, "primary provider answered");

        Ok(ResolvedResult {
            display_text,
            data_source: DataSource::Wihy,
            citations,
            recommendations,
            disclaimer: self.disclaimer_for(&request.kind),
            raw_response: Some(response.raw),
            session_id,
        })
    }

    /// Default disclaimer by request type, used when the answering provider
    /// does not carry its own
    fn disclaimer_for(&self, kind: &RequestKind) -> String {
        match kind {
            RequestKind::News { .. } => self.config.news_disclaimer.clone(),
            RequestKind::Text => self.config.health_disclaimer.clone(),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
