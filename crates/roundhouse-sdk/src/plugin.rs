//! Plugin role contracts and optional capabilities.
//!
//! All hooks take `&self`: the engine holds every plugin as an `Arc<dyn _>`
//! and plugins keep their mutable state behind their own locks. Hooks are
//! never called concurrently for the same plugin instance.

use std::sync::Arc;

use async_trait::async_trait;
use roundhouse_types::{GenesisInfo, InitInfo, PluginConfig, PluginDescriptor, PluginError, RoundUnit};

use crate::context::PluginContext;

/// Behaviour shared by every plugin regardless of role.
///
/// The two `as_*` queries are how a plugin advertises an optional capability.
/// The engine calls each of them once per instance during init and keeps the
/// returned handles; override them with `Some(self)` to opt in.
pub trait Plugin: Send + Sync + 'static {
    /// Static description used for discovery and docs.
    fn descriptor(&self) -> PluginDescriptor;

    fn as_completable(self: Arc<Self>) -> Option<Arc<dyn Completable>> {
        None
    }

    fn as_metrics_provider(self: Arc<Self>) -> Option<Arc<dyn MetricsProvider>> {
        None
    }
}

/// Produces exactly one unit per round.
#[async_trait]
pub trait Source: Plugin {
    /// Prepare the source and report the genesis identity of its dataset.
    async fn init(
        &self,
        ctx: &PluginContext,
        config: PluginConfig,
    ) -> Result<GenesisInfo, PluginError>;

    /// Fetch the unit for `round`.
    ///
    /// Must return the unit for exactly `round` or an error; returning a
    /// different round is treated by the engine as a failed attempt.
    async fn get_unit(&self, round: u64) -> Result<RoundUnit, PluginError>;

    async fn close(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Rewrites a unit between source and sink.
#[async_trait]
pub trait Transform: Plugin {
    async fn init(
        &self,
        ctx: &PluginContext,
        info: &InitInfo,
        config: PluginConfig,
    ) -> Result<(), PluginError>;

    async fn process(&self, unit: RoundUnit) -> Result<RoundUnit, PluginError>;

    async fn close(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Final stage: exports the unit somewhere durable.
#[async_trait]
pub trait Sink: Plugin {
    async fn init(
        &self,
        ctx: &PluginContext,
        info: &InitInfo,
        config: PluginConfig,
    ) -> Result<(), PluginError>;

    async fn receive(&self, unit: &RoundUnit) -> Result<(), PluginError>;

    async fn close(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Round-completion hook, called after the sink accepted a round and the
/// checkpoint has been advanced.
///
/// May be called more than once for the same unit if any hook in the
/// pipeline failed on a previous attempt.
#[async_trait]
pub trait Completable: Send + Sync {
    async fn on_complete(&self, unit: &RoundUnit) -> Result<(), PluginError>;
}

/// Exposes plugin-owned prometheus collectors.
///
/// Called once during init, and only when metrics are enabled.
pub trait MetricsProvider: Send + Sync {
    fn provide_collectors(&self) -> Vec<Box<dyn prometheus::core::Collector>>;
}
