//! Nutrition-lookup fallback provider
//!
//! For free-text queries the fallback is a direct lookup against the
//! nutrition database service. Success is deliberately strict: the HTTP call
//! must succeed *and* the parsed body's `found` field must be strictly
//! `true` — a 2xx answer with `found: false` (or no `found` at all) still
//! escalates to the error classifier. On success the raw JSON-serialized
//! body is the payload; the presentation layer knows how to chart it.

use crate::config::ResolverConfig;
use crate::error::{ProviderError, Result};
use crate::providers::{FallbackAnswer, FallbackProvider};
use crate::types::{DataSource, RequestKind, SearchRequest};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// HTTP client for the nutrition database service
pub struct NutritionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl NutritionClient {
    /// Create a client from resolver configuration
    ///
    /// # Errors
    /// Returns error if the configured base URL is invalid or the HTTP
    /// client cannot be created
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        url::Url::parse(&config.nutrition_api_url)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent("vhealth-resolve Nutrition Client")
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.nutrition_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up a food query, returning the raw body only when it reports a match
    async fn lookup(&self, query: &str) -> std::result::Result<Value, ProviderError> {
        let endpoint = format!("{}/api/search/food", self.base_url);
        debug!(%endpoint, query, "looking up nutrition database");

        let response = self
            .http_client
            .get(&endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::unavailable(format!(
                "nutrition API returned HTTP {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(format!("invalid nutrition body: {}", e)))?;

        // `found` must be strictly true; anything else is a miss
        if body.get("found").and_then(Value::as_bool) != Some(true) {
            return Err(ProviderError::unavailable(format!(
                "no nutrition match for '{}'",
                query
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl FallbackProvider for NutritionClient {
    fn name(&self) -> &'static str {
        "vnutrition"
    }

    fn data_source(&self) -> DataSource {
        DataSource::VNutrition
    }

    fn handles(&self, kind: &RequestKind) -> bool {
        matches!(kind, RequestKind::Text)
    }

    async fn fetch(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<FallbackAnswer, ProviderError> {
        let body = self.lookup(&request.query).await?;
        let display_text = body.to_string();

        // Nutrition results carry no disclaimer text at all; the empty
        // override stops the resolver from attaching the health default
        Ok(FallbackAnswer {
            display_text,
            disclaimer: Some(String::new()),
            raw_response: Some(body),
        })
    }
}
