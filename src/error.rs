//! Error types for vhealth-resolve
//!
//! Two layers of errors live here:
//! - [`ProviderError`] — a tagged failure reported by a provider (primary or
//!   fallback). The tag drives user-facing error classification.
//! - [`Error`] — the library-level error type for everything that is not part
//!   of the resolution pipeline (client construction, config validation).
//!
//! The coordinator itself never surfaces either type from `resolve()`; all
//! provider failures are converted into an error-tagged result.

use thiserror::Error;

/// Result type alias for vhealth-resolve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Library-level error type
///
/// Covers construction and configuration failures. Resolution failures are
/// represented as [`ProviderError`] values and consumed by the classifier,
/// never returned to callers.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A configured backend base URL is not a valid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Failure class reported by a provider
///
/// Each provider classifies its own failures at the point where the cause is
/// still known, so the classifier can switch on a tag instead of sniffing
/// message strings. The five user-facing error categories are derived from
/// these tags (see [`crate::classify`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Request timed out before the backend answered
    Timeout,
    /// Backend reported it could not be reached over the network
    Network,
    /// Backend reported an internal/server-side failure (5xx)
    Server,
    /// Backend rejected the request as a cross-origin violation
    Cors,
    /// Raw connection-level failure (DNS, refused connection, reset)
    ///
    /// This is the class the original system surfaced as a bare fetch
    /// `TypeError`, distinct from a structured `Network` report.
    Transport,
    /// Provider answered but reported no usable result (structured
    /// `success: false`, or `found != true` for nutrition lookups)
    Unavailable,
    /// Response body could not be parsed, or a required field was missing
    Malformed,
    /// Anything that does not fit the classes above
    Unknown,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Network => "network",
            ProviderErrorKind::Server => "server",
            ProviderErrorKind::Cors => "cors",
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Malformed => "malformed",
            ProviderErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A tagged provider failure
///
/// Carries the classification tag plus a human-readable message for logs.
/// The message is never shown to end users; user-facing text comes from the
/// fixed templates in [`crate::classify`].
#[derive(Clone, Debug, Error)]
#[error("{kind} error: {message}")]
pub struct ProviderError {
    /// Failure class used by the error classifier
    pub kind: ProviderErrorKind,
    /// Diagnostic message for logging
    pub message: String,
}

impl ProviderError {
    /// Create a provider error with an explicit tag
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Structured "provider answered but has no result" failure
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }

    /// Parse failure or missing required field
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }

    /// Classify a reqwest transport failure
    ///
    /// Timeouts keep their own tag; everything else at the connection level
    /// (DNS, refused, reset, request build) is a raw transport failure.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ProviderErrorKind::Timeout, err.to_string())
        } else {
            Self::new(ProviderErrorKind::Transport, err.to_string())
        }
    }
}
