//! Observable pipeline status shared between the engine and its callers.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::PipelineError;

/// Lifecycle position. Transitions are linear; a pipeline is never restarted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Constructed,
    Initialized,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Constructed => "constructed",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct Status {
    state: PipelineState,
    last_error: Option<Arc<PipelineError>>,
    retry_count: u64,
    next_round: u64,
    rounds_completed: u64,
    persistence_failures: u64,
}

/// Cheap, clonable read access to a running pipeline.
///
/// Every accessor takes a short read lock, so callers may poll from any task
/// while the round loop updates the values.
#[derive(Debug, Clone, Default)]
pub struct PipelineHandle {
    inner: Arc<RwLock<Status>>,
}

impl PipelineHandle {
    /// `Stopping` without a stop request means the round loop halted on a
    /// fatal error: [`error`](Self::error) holds it, and plugins stay open
    /// until the owner calls `stop()`.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.inner.read().state
    }

    /// Last recorded error. Cleared when a round completes.
    #[must_use]
    pub fn error(&self) -> Option<Arc<PipelineError>> {
        self.inner.read().last_error.clone()
    }

    /// Failed attempts since the last completed round.
    #[must_use]
    pub fn retry_count(&self) -> u64 {
        self.inner.read().retry_count
    }

    /// Round the loop will attempt next.
    #[must_use]
    pub fn next_round(&self) -> u64 {
        self.inner.read().next_round
    }

    /// Rounds completed by this pipeline instance since start.
    #[must_use]
    pub fn rounds_completed(&self) -> u64 {
        self.inner.read().rounds_completed
    }

    /// Checkpoint saves that failed after a successful round.
    #[must_use]
    pub fn persistence_failures(&self) -> u64 {
        self.inner.read().persistence_failures
    }

    pub(crate) fn set_state(&self, state: PipelineState) {
        self.inner.write().state = state;
    }

    pub(crate) fn record_error(&self, error: Option<PipelineError>) {
        self.inner.write().last_error = error.map(Arc::new);
    }

    /// Increments the retry counter and returns the new value.
    pub(crate) fn bump_retry(&self) -> u64 {
        let mut status = self.inner.write();
        status.retry_count += 1;
        status.retry_count
    }

    pub(crate) fn set_next_round(&self, round: u64) {
        self.inner.write().next_round = round;
    }

    /// Success bookkeeping: resets retries, clears the error, counts the round.
    pub(crate) fn complete_round(&self) {
        let mut status = self.inner.write();
        status.retry_count = 0;
        status.last_error = None;
        status.rounds_completed += 1;
    }

    pub(crate) fn note_persistence_failure(&self) -> u64 {
        let mut status = self.inner.write();
        status.persistence_failures += 1;
        status.persistence_failures
    }
}
