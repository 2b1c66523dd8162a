//! Adapter over the WiHy unified health backend
//!
//! The unified backend answers both free-text health queries and
//! category-based news requests through a single `POST /ask` endpoint. The
//! adapter's job is to hide the envelope zoo the backend has accumulated
//! (current `data.response` envelopes, `analysis` envelopes, legacy
//! `wihy_response` payloads) behind the [`PrimaryProvider`] trait, and to
//! classify every failure into a tagged [`ProviderError`] while the cause is
//! still known.

use crate::config::ResolverConfig;
use crate::error::{ProviderError, ProviderErrorKind, Result};
use crate::providers::{PrimaryProvider, PrimaryResponse};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// HTTP client for the unified health backend
#[derive(Debug)]
pub struct WihyClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl WihyClient {
    /// Create a client from resolver configuration
    ///
    /// # Errors
    /// Returns error if the configured base URL is invalid or the HTTP
    /// client cannot be created
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        url::Url::parse(&config.wihy_api_url)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent("vhealth-resolve WiHy Client")
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.wihy_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Issue a request against the `/ask` endpoint
    async fn ask(&self, body: Value) -> std::result::Result<PrimaryResponse, ProviderError> {
        let endpoint = format!("{}/ask", self.base_url);
        debug!(%endpoint, "asking unified backend");

        let response = self
            .http_client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::new(
                ProviderErrorKind::Server,
                format!("WiHy services are temporarily unavailable (HTTP {})", status),
            ));
        }
        if !status.is_success() {
            return Err(ProviderError::unavailable(format!(
                "WiHy backend rejected the request (HTTP {})",
                status
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(format!("invalid WiHy response body: {}", e)))?;

        // A structured failure envelope is treated like any other failure;
        // the backend reports its own cause as an error code string.
        if raw.get("success").and_then(Value::as_bool) == Some(false) {
            let code = raw
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("WiHy API request failed");
            warn!(code, "unified backend reported structured failure");
            return Err(classify_backend_code(code));
        }

        Ok(PrimaryResponse { raw })
    }
}

/// Map a reqwest send failure to a tagged error
///
/// The backend adapter reports structured `Timeout`/`Network` tags the way
/// the original service layer prefixed its messages; anything else at the
/// request level stays a raw transport failure.
fn classify_send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::new(
            ProviderErrorKind::Timeout,
            "request timed out - services may be unavailable",
        )
    } else if err.is_connect() {
        ProviderError::new(
            ProviderErrorKind::Network,
            format!("unable to connect to WiHy services: {}", err),
        )
    } else {
        ProviderError::new(ProviderErrorKind::Transport, err.to_string())
    }
}

/// Map a structured backend error code to a tagged error
fn classify_backend_code(code: &str) -> ProviderError {
    let kind = if code.contains("CORS") {
        ProviderErrorKind::Cors
    } else if code.contains("TIMEOUT") {
        ProviderErrorKind::Timeout
    } else if code.contains("NETWORK") {
        ProviderErrorKind::Network
    } else if code.contains("SERVER") {
        ProviderErrorKind::Server
    } else {
        ProviderErrorKind::Unavailable
    };
    ProviderError::new(kind, code.to_string())
}

/// Append every string in a JSON array at `pointer` to `out`
fn collect_strings(raw: &Value, pointer: &str, out: &mut Vec<String>) {
    if let Some(items) = raw.pointer(pointer).and_then(Value::as_array) {
        for item in items {
            if let Some(s) = item.as_str() {
                out.push(s.to_string());
            }
        }
    }
}

#[async_trait]
impl PrimaryProvider for WihyClient {
    async fn search(&self, query: &str) -> std::result::Result<PrimaryResponse, ProviderError> {
        self.ask(json!({
            "query": query,
            "request_type": "auto",
        }))
        .await
    }

    async fn health_news(
        &self,
        categories: &[String],
        limit: usize,
    ) -> std::result::Result<PrimaryResponse, ProviderError> {
        let query = if categories.is_empty() {
            "Latest health news".to_string()
        } else {
            format!("Latest health news about {}", categories.join(", "))
        };

        self.ask(json!({
            "query": query,
            "request_type": "health",
            "context": {
                "categories": categories,
                "limit": limit,
            },
        }))
        .await
    }

    /// Render the backend payload as display markdown
    ///
    /// Probes the envelope shapes the backend emits, newest first, and falls
    /// back to the raw JSON when none of them match.
    fn format_response(&self, raw: &Value) -> String {
        let mut formatted = String::from("# WiHy Health Intelligence\n\n");

        let answer = raw
            .pointer("/data/response")
            .and_then(Value::as_str)
            .or_else(|| raw.pointer("/analysis/summary").and_then(Value::as_str))
            .or_else(|| raw.pointer("/response").and_then(Value::as_str))
            .or_else(|| {
                raw.pointer("/wihy_response/core_principle")
                    .and_then(Value::as_str)
            });

        match answer {
            Some(text) => formatted.push_str(text),
            None => formatted.push_str(&raw.to_string()),
        }

        let recommendations = self.extract_recommendations(raw);
        if !recommendations.is_empty() {
            formatted.push_str("\n\n## 📋 Recommendations\n");
            for rec in &recommendations {
                formatted.push_str(&format!("- {}\n", rec));
            }
        }

        let citations = self.extract_citations(raw);
        if !citations.is_empty() {
            formatted.push_str("\n\n**Sources:**\n");
            for citation in &citations {
                formatted.push_str(&format!("- {}\n", citation));
            }
        }

        formatted
    }

    fn extract_citations(&self, raw: &Value) -> Vec<String> {
        let mut citations = Vec::new();
        collect_strings(raw, "/data/sources", &mut citations);
        collect_strings(raw, "/analysis/metadata/citations", &mut citations);
        collect_strings(raw, "/analysis/openai_analysis/sources", &mut citations);
        collect_strings(raw, "/citations", &mut citations);
        citations
    }

    fn extract_recommendations(&self, raw: &Value) -> Vec<String> {
        let mut recommendations = Vec::new();

        // Current structured recommendation groups
        for group in [
            "/data/recommendations/immediate_actions",
            "/data/recommendations/lifestyle_changes",
            "/data/recommendations/better_alternatives",
            "/data/recommendations/shopping_tips",
            "/data/recommendations/meal_planning",
        ] {
            collect_strings(raw, group, &mut recommendations);
        }

        // Flat array shapes (legacy and analysis envelopes)
        collect_strings(raw, "/data/legacy_recommendations", &mut recommendations);
        collect_strings(raw, "/analysis/recommendations", &mut recommendations);
        collect_strings(raw, "/recommendations", &mut recommendations);

        recommendations
    }
}
