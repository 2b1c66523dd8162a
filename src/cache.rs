//! Local result cache
//!
//! A keyed store for the most recently resolved payload per cache key.
//! Deliberately simple: last write wins, no eviction, no TTL. An entry is
//! valid until it is overwritten or the cache is cleared by the embedding
//! application. The hard part of caching in this system is *when* to consult
//! the cache (the resolver's decision sequence), not how it stores data.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// A cached resolution payload
#[derive(Clone, Debug)]
pub struct CachedResult {
    /// Display-ready payload text
    pub payload: String,

    /// Which provider produced the payload (e.g. "wihy", "news-feed")
    pub source_ref: String,

    /// When the entry was written
    pub written_at: DateTime<Utc>,
}

/// Keyed last-write-wins store for resolved payloads
///
/// Shared across all callers within a session. Writes are serialized by an
/// internal lock; at most one live entry exists per key.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<String, CachedResult>>,
}

impl ResultCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached payload for a key
    pub fn get(&self, key: &str) -> Option<CachedResult> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let hit = entries.get(key).cloned();
        debug!(key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Store a payload under a key, unconditionally overwriting any prior entry
    pub fn set(&self, key: &str, payload: impl Into<String>, source_ref: impl Into<String>) {
        let entry = CachedResult {
            payload: payload.into(),
            source_ref: source_ref.into(),
            written_at: Utc::now(),
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        debug!(key, source_ref = %entry.source_ref, "cache write");
        entries.insert(key.to_string(), entry);
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        debug!(count = entries.len(), "cache cleared");
        entries.clear();
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// True if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
