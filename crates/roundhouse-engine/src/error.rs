//! Engine error taxonomy.
//!
//! Fatal classes ([`PipelineError::Configuration`], `PluginNotFound`,
//! `PluginInit`, `GenesisMismatch`) abort `init` and reach the caller.
//! [`StageError`]s never leave the round loop; they are only visible through
//! [`Pipeline::error`](crate::Pipeline::error) and the retry gauge.

use std::fmt;

use roundhouse_sdk::RegistryError;
use roundhouse_state::StateError;
use roundhouse_types::{PluginError, PluginRole};

use crate::status::PipelineState;

/// Code attached when a source answers with a unit for the wrong round.
pub const ROUND_MISMATCH: &str = "ROUND_MISMATCH";

/// Which step of a round attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Source,
    /// Transform at this position in the configured chain.
    Transform(usize),
    Sink,
    /// A completion hook, after the round was exported.
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Transform(i) => write!(f, "transform[{i}]"),
            Self::Sink => f.write_str("sink"),
            Self::Complete => f.write_str("complete"),
        }
    }
}

/// A failed round attempt. Always retried.
#[derive(Debug, thiserror::Error)]
#[error("{stage} '{plugin}' failed at round {round}: {source}")]
pub struct StageError {
    pub stage: Stage,
    pub plugin: String,
    pub round: u64,
    #[source]
    pub source: PluginError,
}

impl StageError {
    #[must_use]
    pub fn new(stage: Stage, plugin: impl Into<String>, round: u64, source: PluginError) -> Self {
        Self {
            stage,
            plugin: plugin.into(),
            round,
            source,
        }
    }

    /// Source returned `actual` when asked for `expected`.
    #[must_use]
    pub fn round_mismatch(plugin: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::new(
            Stage::Source,
            plugin,
            expected,
            PluginError::data(
                ROUND_MISMATCH,
                format!("requested round {expected}, source returned round {actual}"),
            ),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration:\n  - {}", .0.join("\n  - "))]
    Configuration(Vec<String>),

    #[error(transparent)]
    PluginNotFound(#[from] RegistryError),

    #[error("{role} plugin '{name}' failed to initialize: {source}")]
    PluginInit {
        role: PluginRole,
        name: String,
        #[source]
        source: PluginError,
    },

    #[error(
        "genesis mismatch: checkpoint belongs to genesis {persisted} but the source reports {live}"
    )]
    GenesisMismatch { persisted: String, live: String },

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("{role} plugin '{name}' failed to close: {source}")]
    Shutdown {
        role: PluginRole,
        name: String,
        #[source]
        source: PluginError,
    },

    #[error("checkpoint persistence failed: {0}")]
    Persistence(#[from] StateError),

    #[error("cannot {operation} a pipeline that is {state}")]
    Lifecycle {
        operation: &'static str,
        state: PipelineState,
    },

    #[error("round loop terminated abnormally: {0}")]
    Fatal(String),

    #[error("metrics: {0}")]
    Metrics(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("profiling: {0}")]
    Profiling(String),
}

impl PipelineError {
    /// Whether the round loop retries this error rather than surfacing it.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Stage(_))
    }

    #[must_use]
    pub fn as_stage(&self) -> Option<&StageError> {
        match self {
            Self::Stage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<prometheus::Error> for PipelineError {
    fn from(e: prometheus::Error) -> Self {
        Self::Metrics(e.to_string())
    }
}
