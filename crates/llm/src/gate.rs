//! Process-wide readiness gate for the language model.
//!
//! The gate starts in [`BackendState::Loading`]. The loader task moves it
//! to `Ready` once the model server reports the model as loaded, or to
//! `Failed` if loading never completes. Gated handlers call
//! [`BackendGate::check`] before doing any model work.

use aieditor_core::error::CoreError;
use serde::Serialize;
use tokio::sync::watch;

/// Lifecycle of the analysis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    Loading,
    Ready,
    Failed,
}

impl BackendState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Shared readiness flag. Cheap to read from every request.
#[derive(Debug)]
pub struct BackendGate {
    tx: watch::Sender<BackendState>,
}

impl Default for BackendGate {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendGate {
    /// A gate in the `Loading` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(BackendState::Loading);
        Self { tx }
    }

    /// A gate that is already open.
    pub fn ready() -> Self {
        let gate = Self::new();
        gate.mark_ready();
        gate
    }

    pub fn state(&self) -> BackendState {
        *self.tx.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == BackendState::Ready
    }

    pub fn mark_ready(&self) {
        self.transition(BackendState::Ready);
    }

    pub fn mark_failed(&self) {
        self.transition(BackendState::Failed);
    }

    /// Back to `Loading`, e.g. when the model server restarts.
    pub fn mark_loading(&self) {
        self.transition(BackendState::Loading);
    }

    /// Reject the request unless the backend is ready.
    pub fn check(&self) -> Result<(), CoreError> {
        match self.state() {
            BackendState::Ready => Ok(()),
            BackendState::Loading => Err(CoreError::BackendNotReady(
                "Language model is still loading".to_string(),
            )),
            BackendState::Failed => Err(CoreError::BackendNotReady(
                "Language model failed to load".to_string(),
            )),
        }
    }

    fn transition(&self, next: BackendState) {
        let previous = self.tx.send_replace(next);
        if previous != next {
            tracing::info!(from = previous.as_str(), to = next.as_str(), "Backend state changed");
        }
    }
}
