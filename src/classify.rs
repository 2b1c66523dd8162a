//! User-facing error classification
//!
//! When the primary provider and every applicable fallback have failed, the
//! pair of tagged failures is mapped to exactly one of five fixed message
//! templates. Priority order is fixed; the first matching rule wins no matter
//! which of the two failures carries the matching tag.

use crate::error::{ProviderError, ProviderErrorKind};
use tracing::debug;

/// The five observable error categories
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Cross-origin/configuration problem on our side
    Cors,
    /// Structured network or timeout report from the backend
    Connectivity,
    /// Backend reported a server-side outage
    Server,
    /// Raw connection-level hiccup (failed fetch)
    ConnectionHiccup,
    /// Everything else; points the user at still-working features
    General,
}

impl ErrorCategory {
    /// The fixed user-facing template for this category
    pub fn message(self) -> &'static str {
        match self {
            ErrorCategory::Cors => {
                "Configuration issue on our end! 🔧 Our team is working on this - \
                 please try again later."
            }
            ErrorCategory::Connectivity => {
                "We're having technical difficulties reaching our servers ☕ \
                 Come back in a few minutes!"
            }
            ErrorCategory::Server => {
                "Our servers are taking a break 🤖 Please try again in a moment."
            }
            ErrorCategory::ConnectionHiccup => {
                "Connection hiccup! 📡 Please check your internet and try again."
            }
            ErrorCategory::General => {
                "Something went wrong with your search 🔄 You can still browse the \
                 latest health news, upload an image for analysis, or view example \
                 charts and results while we sort this out."
            }
        }
    }
}

/// Classify a failed resolution into one of the five categories
///
/// `primary` is the primary provider's failure; `fallback` is the last
/// fallback failure, when the chain was reached at all. Rules, in priority
/// order:
///
/// 1. either side reports a CORS rejection;
/// 2. either side reports a structured network or timeout failure;
/// 3. either side reports a server-side outage;
/// 4. either side failed at the raw transport level (failed fetch);
/// 5. otherwise the general multi-feature message.
pub fn classify(primary: &ProviderError, fallback: Option<&ProviderError>) -> ErrorCategory {
    let kinds = [Some(primary.kind), fallback.map(|f| f.kind)];
    let either = |kind: ProviderErrorKind| kinds.iter().any(|k| *k == Some(kind));

    let category = if either(ProviderErrorKind::Cors) {
        ErrorCategory::Cors
    } else if either(ProviderErrorKind::Network) || either(ProviderErrorKind::Timeout) {
        ErrorCategory::Connectivity
    } else if either(ProviderErrorKind::Server) {
        ErrorCategory::Server
    } else if either(ProviderErrorKind::Transport) {
        ErrorCategory::ConnectionHiccup
    } else {
        ErrorCategory::General
    };

    debug!(
        primary = %primary.kind,
        fallback = fallback.map(|f| f.kind.to_string()).unwrap_or_default(),
        ?category,
        "classified failed resolution"
    );
    category
}
