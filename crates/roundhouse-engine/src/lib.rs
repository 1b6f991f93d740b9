//! Round-by-round pipeline engine.
//!
//! A [`Pipeline`] owns one source, an ordered list of transforms and one sink
//! resolved from a [`Registry`](roundhouse_sdk::Registry). After
//! [`init`](Pipeline::init) and [`start`](Pipeline::start) a background task
//! pulls round `N` from the source, threads it through every transform, hands
//! it to the sink, persists `N + 1` as the next round and finally runs the
//! completion hooks. Any stage failure retries the same round until it
//! succeeds or the pipeline is stopped.

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub(crate) mod profiling;
pub(crate) mod runner;
pub(crate) mod stages;
pub mod status;

pub use config::types::{MetricsConfig, MetricsMode, NamedConfig, PipelineConfig};
pub use error::{PipelineError, Stage, StageError};
pub use metrics::PipelineMetrics;
pub use pipeline::Pipeline;
pub use status::{PipelineHandle, PipelineState};
