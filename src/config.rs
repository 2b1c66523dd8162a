//! Configuration types for vhealth-resolve

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the resolver and its bundled HTTP providers
///
/// Every field has a sensible default; `ResolverConfig::default()` works out
/// of the box against the production backends.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the unified health backend (default: "https://ml.wihy.ai")
    #[serde(default = "default_wihy_api_url")]
    pub wihy_api_url: String,

    /// Base URL of the news-feed service (default: "https://services.wihy.ai")
    #[serde(default = "default_news_api_url")]
    pub news_api_url: String,

    /// Base URL of the nutrition-lookup service (default: "http://localhost:5000")
    #[serde(default = "default_nutrition_api_url")]
    pub nutrition_api_url: String,

    /// Per-request HTTP timeout (default: 30 seconds)
    #[serde(default = "default_http_timeout", with = "duration_serde")]
    pub http_timeout: Duration,

    /// Number of articles requested from the news feed (default: 6)
    #[serde(default = "default_news_limit")]
    pub news_limit: usize,

    /// Disclaimer attached to free-text health answers
    #[serde(default = "default_health_disclaimer")]
    pub health_disclaimer: String,

    /// Disclaimer attached to news digests
    #[serde(default = "default_news_disclaimer")]
    pub news_disclaimer: String,

    /// Disclaimer attached to error results
    #[serde(default = "default_error_disclaimer")]
    pub error_disclaimer: String,

    /// Placeholder shown instead of a background fetch on back/forward
    /// navigation with no cached result
    #[serde(default = "default_new_search_prompt")]
    pub new_search_prompt: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            wihy_api_url: default_wihy_api_url(),
            news_api_url: default_news_api_url(),
            nutrition_api_url: default_nutrition_api_url(),
            http_timeout: default_http_timeout(),
            news_limit: default_news_limit(),
            health_disclaimer: default_health_disclaimer(),
            news_disclaimer: default_news_disclaimer(),
            error_disclaimer: default_error_disclaimer(),
            new_search_prompt: default_new_search_prompt(),
        }
    }
}

fn default_wihy_api_url() -> String {
    "https://ml.wihy.ai".to_string()
}

fn default_news_api_url() -> String {
    "https://services.wihy.ai".to_string()
}

fn default_nutrition_api_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_news_limit() -> usize {
    6
}

fn default_health_disclaimer() -> String {
    "This guidance is based on evidence-based health principles. Always consult \
     healthcare professionals for personalized medical advice."
        .to_string()
}

fn default_news_disclaimer() -> String {
    "Health news provided by AI. Always consult healthcare professionals for \
     medical advice."
        .to_string()
}

fn default_error_disclaimer() -> String {
    "If this keeps happening, refresh the page or contact support.".to_string()
}

fn default_new_search_prompt() -> String {
    "Please start a new search to see results here.".to_string()
}

// Duration serialization helper (serializes as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
