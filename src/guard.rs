//! Single-flight concurrency guard
//!
//! The resolver enforces strict serialization: at most one resolution may be
//! in flight per resolver instance, regardless of key. The guard is one
//! explicit state value — `Idle` or `InFlight(key)` — transitioned with a
//! compare-and-set under a mutex, plus the key of the last resolution that
//! was started. A repeated request for that same key is refused even after
//! the earlier resolution completed; [`SingleFlight::reset`] is the
//! affordance for callers that want to re-run an identical query.

use std::sync::{Arc, Mutex};

/// Whether a resolution is currently executing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlightState {
    /// No resolution in flight
    Idle,
    /// A resolution for the named key is executing
    InFlight(String),
}

#[derive(Debug)]
struct GuardState {
    state: FlightState,
    last_started_key: Option<String>,
}

/// Instance-global single-flight guard
///
/// Cloneable handle; clones share the same state.
#[derive(Clone, Debug)]
pub struct SingleFlight {
    inner: Arc<Mutex<GuardState>>,
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleFlight {
    /// Create a guard in the idle state with no remembered key
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(GuardState {
                state: FlightState::Idle,
                last_started_key: None,
            })),
        }
    }

    /// Try to start a resolution for `key`
    ///
    /// Returns `None` when another resolution is already in flight, or when
    /// `key` equals the last started key — the caller should treat either as
    /// "already handled / in progress" and not surface a new loading state.
    ///
    /// On success the returned permit keeps the guard in flight; dropping it
    /// returns the guard to idle on every exit path. The last started key is
    /// retained across completions.
    pub fn begin(&self, key: &str) -> Option<FlightPermit> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if matches!(guard.state, FlightState::InFlight(_)) {
            return None;
        }
        if guard.last_started_key.as_deref() == Some(key) {
            return None;
        }

        guard.state = FlightState::InFlight(key.to_string());
        guard.last_started_key = Some(key.to_string());
        Some(FlightPermit {
            guard: Arc::clone(&self.inner),
        })
    }

    /// Current flight state
    pub fn state(&self) -> FlightState {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .state
            .clone()
    }

    /// Key of the most recently started resolution, if any
    pub fn last_started_key(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_started_key
            .clone()
    }

    /// Return to idle and forget the last started key
    ///
    /// Lets a caller deliberately re-run the same query.
    pub fn reset(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.state = FlightState::Idle;
        guard.last_started_key = None;
    }
}

/// RAII token proving a resolution slot is held
///
/// Dropping the permit clears the in-flight state. Because every exit path of
/// the resolver drops it — success, fallback success, or final failure — the
/// guard can never be left stuck in flight.
#[derive(Debug)]
pub struct FlightPermit {
    guard: Arc<Mutex<GuardState>>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        let mut guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        guard.state = FlightState::Idle;
        // last_started_key is intentionally retained
    }
}
