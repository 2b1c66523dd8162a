//! # vhealth-resolve
//!
//! Query resolution coordinator for a health and nutrition search product.
//!
//! ## Design Philosophy
//!
//! vhealth-resolve is designed to be:
//! - **Never-failing** - `resolve()` always produces a displayable result,
//!   converting exhausted providers into one of five fixed error messages
//! - **Cache-first** - resolved answers are kept per session and served
//!   instantly on repeat navigation, last write wins
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//! - **Pluggable** - primary and fallback providers are trait objects, so
//!   hosts can swap backends or extend the fallback chain
//!
//! ## Quick Start
//!
//! ```no_run
//! use vhealth_resolve::{ResolverConfig, SearchRequest, SearchResolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = SearchResolver::new(ResolverConfig::default())?;
//!
//!     if let Some(result) = resolver
//!         .resolve(SearchRequest::text("is quinoa healthy?"))
//!         .await
//!         .into_result()
//!     {
//!         println!("[{}] {}", result.data_source, result.display_text);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Session result cache
pub mod cache;
/// Failure classification into user-facing messages
pub mod classify;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Single-flight resolution guard
pub mod guard;
/// Primary and fallback provider implementations
pub mod providers;
/// The resolution coordinator
pub mod resolver;
/// Core request and result types
pub mod types;

// Re-export commonly used types
pub use cache::{CachedResult, ResultCache};
pub use classify::{ErrorCategory, classify};
pub use config::ResolverConfig;
pub use error::{Error, ProviderError, ProviderErrorKind, Result};
pub use guard::{FlightPermit, FlightState, SingleFlight};
pub use providers::{
    FallbackAnswer, FallbackProvider, NewsFeedClient, NutritionClient, PrimaryProvider,
    PrimaryResponse, WihyClient, format_news_digest,
};
pub use resolver::{Resolution, SearchResolver};
pub use types::{
    DataSource, NavigationResult, NewsArticle, RequestKind, RequestOrigin, ResolvedResult,
    SearchRequest,
};
