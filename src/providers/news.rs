//! News-feed fallback provider
//!
//! When the unified backend cannot answer a category-based news request, the
//! resolver falls back to the product's news-feed service and renders the
//! articles into a markdown digest. The digest layout is part of the cache
//! contract: whatever is rendered here is what later cache hits replay.

use crate::config::ResolverConfig;
use crate::error::{ProviderError, Result};
use crate::providers::{FallbackAnswer, FallbackProvider};
use crate::types::{DataSource, NewsArticle, RequestKind, SearchRequest};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

/// Envelope returned by the news-feed service
#[derive(Debug, Deserialize)]
struct NewsFeedEnvelope {
    success: bool,
    #[serde(default)]
    articles: Vec<NewsArticle>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the news-feed service
#[derive(Debug)]
pub struct NewsFeedClient {
    http_client: reqwest::Client,
    base_url: String,
    limit: usize,
}

impl NewsFeedClient {
    /// Create a client from resolver configuration
    ///
    /// # Errors
    /// Returns error if the configured base URL is invalid or the HTTP
    /// client cannot be created
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        url::Url::parse(&config.news_api_url)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent("vhealth-resolve News Reader")
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.news_api_url.trim_end_matches('/').to_string(),
            limit: config.news_limit,
        })
    }

    /// Fetch articles for the given categories
    async fn fetch_articles(
        &self,
        categories: &[String],
        limit: usize,
    ) -> std::result::Result<Vec<NewsArticle>, ProviderError> {
        let endpoint = format!("{}/api/news/articles", self.base_url);
        debug!(%endpoint, ?categories, limit, "fetching news feed");

        let response = self
            .http_client
            .get(&endpoint)
            .query(&[("category", categories.join(",")), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::unavailable(format!(
                "news feed returned HTTP {}",
                status
            )));
        }

        let envelope: NewsFeedEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(format!("invalid news feed body: {}", e)))?;

        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "failed to fetch health news".to_string());
            warn!(message, "news feed reported structured failure");
            return Err(ProviderError::unavailable(message));
        }

        Ok(envelope.articles)
    }
}

/// Render articles into the display digest
///
/// For each article: a title heading, a source/domain line, the category, a
/// human-formatted publish date, the relevance percentage (rounded from the
/// 0–1 score), the summary, an optional comma-joined tag line, the article
/// link, and a separator — concatenated in array order.
pub fn format_news_digest(articles: &[NewsArticle]) -> String {
    let mut formatted = String::from("# Latest Health News\n\n");

    for article in articles {
        formatted.push_str(&format!("## {}\n\n", article.title));
        formatted.push_str(&format!(
            "**Source:** {} ({})\n",
            article.source, article.domain
        ));
        formatted.push_str(&format!("**Category:** {}\n", article.category));
        formatted.push_str(&format!(
            "**Published:** {}\n",
            format_publish_date(&article.published_date)
        ));
        formatted.push_str(&format!(
            "**Relevance:** {}%\n\n",
            (article.relevance_score * 100.0).round() as i64
        ));
        formatted.push_str(&format!("{}\n\n", article.summary));

        if !article.tags.is_empty() {
            formatted.push_str(&format!("**Tags:** {}\n\n", article.tags.join(", ")));
        }

        formatted.push_str(&format!("[Read Full Article]({})\n\n", article.url));
        formatted.push_str("---\n\n");
    }

    formatted
}

/// Human-format an ISO-8601 publish date, keeping the raw string when it
/// does not parse
fn format_publish_date(published: &str) -> String {
    match DateTime::parse_from_rfc3339(published) {
        Ok(date) => date.format("%-m/%-d/%Y").to_string(),
        Err(_) => published.to_string(),
    }
}

#[async_trait]
impl FallbackProvider for NewsFeedClient {
    fn name(&self) -> &'static str {
        "news-feed"
    }

    fn data_source(&self) -> DataSource {
        DataSource::OpenAi
    }

    fn handles(&self, kind: &RequestKind) -> bool {
        matches!(kind, RequestKind::News { .. })
    }

    async fn fetch(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<FallbackAnswer, ProviderError> {
        let category = match &request.kind {
            RequestKind::News { category } => category.clone(),
            RequestKind::Text => {
                return Err(ProviderError::unavailable(
                    "news feed only serves category requests",
                ));
            }
        };

        let articles = self.fetch_articles(&[category], self.limit).await?;
        Ok(FallbackAnswer {
            display_text: format_news_digest(&articles),
            disclaimer: None,
            raw_response: None,
        })
    }
}
