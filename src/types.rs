//! Core types for query resolution
//!
//! The unit of work is a [`SearchRequest`] — free text or a news-category
//! selector — and the unit of output is a [`ResolvedResult`] tagged with the
//! [`DataSource`] that produced it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provenance tag attached to every resolved result
///
/// This is display/analytics metadata describing which stage of the pipeline
/// produced the answer, not a literal reference to any particular vendor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Every source failed; the result carries a user-facing error message
    Error,
    /// News-feed fallback answered
    #[serde(rename = "openai")]
    OpenAi,
    /// Answer came from the local result cache
    Local,
    /// Nutrition-lookup fallback answered
    #[serde(rename = "vnutrition")]
    VNutrition,
    /// Primary unified backend answered
    Wihy,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataSource::Error => "error",
            DataSource::OpenAi => "openai",
            DataSource::Local => "local",
            DataSource::VNutrition => "vnutrition",
            DataSource::Wihy => "wihy",
        };
        f.write_str(name)
    }
}

/// What kind of answer the request is asking for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestKind {
    /// Free-text health query
    Text,
    /// Category-based news request ("I'm Feeling Healthy")
    News {
        /// News category selector (e.g. "all", "nutrition", "fitness")
        category: String,
    },
}

/// How the request reached the resolver
///
/// The coordinator refuses to issue surprise background fetches when the user
/// merely navigated back to a results view; this hint is how the caller
/// reports that situation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOrigin {
    /// The user explicitly submitted a new search
    #[default]
    NewSearch,
    /// The results view was re-entered without an explicit search
    Revisit,
    /// The caller detected browser back/forward navigation
    HistoryNavigation,
}

/// A resolution request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text (raw, as the caller submitted it)
    pub query: String,

    /// Free-text query or category-based news request
    pub kind: RequestKind,

    /// Result precomputed by a prior screen, handed over verbatim
    ///
    /// When present it wins over everything, including a cache hit — it may
    /// represent fresher, user-specific state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_result: Option<NavigationResult>,

    /// How this request reached the resolver
    #[serde(default)]
    pub origin: RequestOrigin,
}

impl SearchRequest {
    /// Build a free-text query request
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind: RequestKind::Text,
            navigation_result: None,
            origin: RequestOrigin::NewSearch,
        }
    }

    /// Build a category-based news request
    pub fn news(category: impl Into<String>) -> Self {
        Self {
            query: String::new(),
            kind: RequestKind::News {
                category: category.into(),
            },
            navigation_result: None,
            origin: RequestOrigin::NewSearch,
        }
    }

    /// Attach a result handed over from a prior screen
    #[must_use]
    pub fn with_navigation_result(mut self, result: NavigationResult) -> Self {
        self.navigation_result = Some(result);
        self
    }

    /// Set the request origin hint
    #[must_use]
    pub fn with_origin(mut self, origin: RequestOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Derive the cache key for this request
    ///
    /// `health_news_{category}` for news requests, otherwise the raw query
    /// text unmodified — no trimming or normalization beyond what the caller
    /// already performed.
    pub fn cache_key(&self) -> String {
        match &self.kind {
            RequestKind::News { category } => format!("health_news_{}", category),
            RequestKind::Text => self.query.clone(),
        }
    }
}

/// A result precomputed by a prior screen
///
/// Unlike [`ResolvedResult`], the provenance tag is optional here: a handoff
/// without a tag defaults to [`DataSource::Wihy`] when the resolver passes
/// it through.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavigationResult {
    /// Display-ready answer text
    pub display_text: String,

    /// Provenance tag embedded by the prior screen, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,

    /// Source citations
    #[serde(default)]
    pub citations: Vec<String>,

    /// Actionable recommendations
    #[serde(default)]
    pub recommendations: Vec<String>,

    /// Disclaimer text
    #[serde(default)]
    pub disclaimer: String,

    /// Raw backend response, for chart components downstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,

    /// Backend session identifier, if the prior screen had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// The displayable outcome of a resolution
///
/// Created fresh on every call and owned by the caller; the resolver keeps no
/// shared mutable state inside a returned result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolvedResult {
    /// Display-ready answer text
    pub display_text: String,

    /// Which stage of the pipeline produced this answer
    pub data_source: DataSource,

    /// Source citations extracted from the backend response
    #[serde(default)]
    pub citations: Vec<String>,

    /// Actionable recommendations extracted from the backend response
    #[serde(default)]
    pub recommendations: Vec<String>,

    /// Disclaimer text chosen by request type
    #[serde(default)]
    pub disclaimer: String,

    /// Raw backend response, for chart components downstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,

    /// Backend session identifier, when the backend issued one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ResolvedResult {
    /// A result carrying only display text and a provenance tag
    pub fn plain(display_text: impl Into<String>, data_source: DataSource) -> Self {
        Self {
            display_text: display_text.into(),
            data_source,
            citations: Vec::new(),
            recommendations: Vec::new(),
            disclaimer: String::new(),
            raw_response: None,
            session_id: None,
        }
    }
}

impl From<NavigationResult> for ResolvedResult {
    fn from(nav: NavigationResult) -> Self {
        Self {
            display_text: nav.display_text,
            data_source: nav.data_source.unwrap_or(DataSource::Wihy),
            citations: nav.citations,
            recommendations: nav.recommendations,
            disclaimer: nav.disclaimer,
            raw_response: nav.raw_response,
            session_id: nav.session_id,
        }
    }
}

/// A health news article as delivered by the news-feed backend
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    /// Article headline
    pub title: String,

    /// Publication name
    pub source: String,

    /// Publication domain
    pub domain: String,

    /// News category the article was filed under
    pub category: String,

    /// Publish timestamp as an ISO-8601 string
    pub published_date: String,

    /// Relevance score in `[0, 1]`
    pub relevance_score: f64,

    /// Article summary text
    pub summary: String,

    /// Topic tags, if the feed provides them
    #[serde(default)]
    pub tags: Vec<String>,

    /// Link to the full article
    pub url: String,
}
