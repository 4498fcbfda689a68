//! Query readiness gate
//!
//! Query-class operations are refused until the lifecycle controller marks
//! the service ready (after storage is seeded).

use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Whether queries are accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    NotReady = 0,
    Ready = 1,
}

/// Shared handle to the readiness state
///
/// Clones observe and update the same state.
#[derive(Debug, Clone)]
pub struct Readiness {
    state: Arc<AtomicU8>,
}

impl Readiness {
    /// A gate that starts closed
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ReadyState::NotReady as u8)),
        }
    }

    pub fn state(&self) -> ReadyState {
        match self.state.load(Ordering::Acquire) {
            1 => ReadyState::Ready,
            _ => ReadyState::NotReady,
        }
    }

    pub fn set(&self, state: ReadyState) {
        self.state.store(state as u8, Ordering::Release);
        tracing::info!(state = ?state, "Query readiness changed");
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ReadyState::Ready
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_not_ready() {
        assert_eq!(Readiness::new().state(), ReadyState::NotReady);
    }

    #[test]
    fn test_clones_share_state() {
        let gate = Readiness::new();
        let observer = gate.clone();
        gate.set(ReadyState::Ready);
        assert!(observer.is_ready());
        gate.set(ReadyState::NotReady);
        assert!(!observer.is_ready());
    }
}
