//! `noop` sink: accepts every round and discards it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use roundhouse_sdk::prelude::*;

/// Registry name.
pub const NAME: &str = "noop";

#[derive(Debug, Default)]
pub struct NoopSink {
    received: AtomicU64,
}

impl NoopSink {
    /// Rounds accepted so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

impl Plugin for NoopSink {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(NAME, "Discards every round")
    }
}

#[async_trait]
impl Sink for NoopSink {
    async fn init(
        &self,
        _ctx: &PluginContext,
        info: &InitInfo,
        _config: PluginConfig,
    ) -> Result<(), PluginError> {
        tracing::debug!(network = %info.network, next_round = info.next_round, "Noop sink ready");
        Ok(())
    }

    async fn receive(&self, unit: &RoundUnit) -> Result<(), PluginError> {
        self.received.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(round = unit.round(), items = unit.items.len(), "Discarded round");
        Ok(())
    }

    async fn close(&self) -> Result<(), PluginError> {
        tracing::debug!(received = self.received(), "Noop sink closed");
        Ok(())
    }
}

/// Register the `noop` sink.
///
/// # Errors
///
/// Fails if the name is already registered.
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_sink(NAME, || Arc::new(NoopSink::default()))
}
