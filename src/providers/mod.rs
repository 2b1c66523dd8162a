//! Provider traits and bundled backend clients
//!
//! The resolver consults injected providers in a strict priority order: the
//! primary unified backend first, then an ordered chain of fallbacks. The
//! core abstractions are the [`PrimaryProvider`] and [`FallbackProvider`]
//! traits; the bundled implementations are:
//!
//! - [`WihyClient`]: adapter over the unified health backend
//! - [`NewsFeedClient`]: fallback for category-based news requests
//! - [`NutritionClient`]: fallback for free-text nutrition lookups
//!
//! All client calls are asynchronous and non-blocking; every failure is
//! reported as a tagged [`ProviderError`] so the coordinator can escalate
//! down the chain and, at the end, classify what the user should see.

mod news;
mod nutrition;
mod wihy;

pub use news::{NewsFeedClient, format_news_digest};
pub use nutrition::NutritionClient;
pub use wihy::WihyClient;

use crate::error::ProviderError;
use crate::types::{DataSource, RequestKind, SearchRequest};
use async_trait::async_trait;
use serde_json::Value;

/// Successful answer from the primary provider
#[must_use]
#[derive(Clone, Debug)]
pub struct PrimaryResponse {
    /// The raw backend payload, kept whole for chart components downstream
    pub raw: Value,
}

impl PrimaryResponse {
    /// Session identifier issued by the backend, if any
    pub fn session_id(&self) -> Option<String> {
        self.raw
            .get("session_id")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Successful answer from a fallback provider
#[must_use]
#[derive(Clone, Debug)]
pub struct FallbackAnswer {
    /// Display-ready payload text
    pub display_text: String,

    /// Disclaimer override, when the fallback carries its own
    pub disclaimer: Option<String>,

    /// Raw backend payload, when one is worth keeping
    pub raw_response: Option<Value>,
}

/// The unified backend capable of answering both free-text health queries
/// and category-based news requests
///
/// A structured `success: false` envelope and a transport failure are both
/// reported as a tagged error — the coordinator treats them identically and
/// advances to the fallback chain either way.
#[async_trait]
pub trait PrimaryProvider: Send + Sync {
    /// Answer a free-text health query
    ///
    /// # Errors
    ///
    /// Returns a tagged error when the backend cannot be reached, reports a
    /// structured failure, or answers with an unusable body.
    async fn search(&self, query: &str) -> Result<PrimaryResponse, ProviderError>;

    /// Fetch category-based health news
    ///
    /// # Errors
    ///
    /// Same contract as [`search`](PrimaryProvider::search).
    async fn health_news(
        &self,
        categories: &[String],
        limit: usize,
    ) -> Result<PrimaryResponse, ProviderError>;

    /// Format the raw payload into display text
    fn format_response(&self, raw: &Value) -> String;

    /// Extract source citations from the raw payload
    fn extract_citations(&self, raw: &Value) -> Vec<String>;

    /// Extract actionable recommendations from the raw payload
    fn extract_recommendations(&self, raw: &Value) -> Vec<String>;
}

/// One alternate source in the ordered fallback chain
///
/// The chain is strictly ordered and short-circuits on first success; there
/// are no retries within a tier. Each provider declares which request kinds
/// it can serve.
#[async_trait]
pub trait FallbackProvider: Send + Sync {
    /// Human-readable name for logging and cache source references
    fn name(&self) -> &'static str;

    /// Provenance tag attached to answers from this provider
    fn data_source(&self) -> DataSource;

    /// Whether this provider can serve the given request kind
    fn handles(&self, kind: &RequestKind) -> bool;

    /// Attempt to answer the request
    ///
    /// # Errors
    ///
    /// Returns a tagged error on transport failure, a structured "no result"
    /// report, or a malformed response; the coordinator escalates to the next
    /// provider in the chain.
    async fn fetch(&self, request: &SearchRequest) -> Result<FallbackAnswer, ProviderError>;
}
