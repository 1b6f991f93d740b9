//! `synthetic` source: generates deterministic rounds from a seed.
//!
//! Useful for smoke tests, benchmarks and trying out sinks without an
//! upstream. With `tip` set it behaves like a chain head: rounds beyond the
//! tip are reported as not yet available.

pub mod config;
pub mod source;

use std::sync::{Arc, OnceLock};

use roundhouse_sdk::prelude::*;
use roundhouse_sdk::prometheus::core::Collector;
use roundhouse_sdk::prometheus::IntCounter;
use serde_json::json;

/// Registry name.
pub const NAME: &str = "synthetic";

#[derive(Default)]
pub struct SyntheticSource {
    config: OnceLock<config::Config>,
    generated: OnceLock<IntCounter>,
}

impl SyntheticSource {
    fn config(&self) -> Result<&config::Config, PluginError> {
        self.config
            .get()
            .ok_or_else(|| PluginError::internal("NOT_INITIALIZED", "synthetic source used before init"))
    }
}

impl Plugin for SyntheticSource {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(NAME, "Deterministic round generator")
            .with_sample_config(config::SAMPLE_CONFIG)
    }

    fn as_metrics_provider(self: Arc<Self>) -> Option<Arc<dyn MetricsProvider>> {
        Some(self)
    }
}

#[async_trait]
impl Source for SyntheticSource {
    async fn init(&self, _ctx: &PluginContext, config: PluginConfig) -> Result<GenesisInfo, PluginError> {
        let cfg: config::Config = config.decode()?;
        cfg.validate()?;

        let counter = IntCounter::new("synthetic_units_total", "Units generated by the synthetic source")
            .map_err(|e| PluginError::internal("METRICS", e.to_string()))?;

        let already = || PluginError::internal("ALREADY_INITIALIZED", "init called twice");
        self.config.set(cfg).map_err(|_| already())?;
        self.generated.set(counter).map_err(|_| already())?;

        let cfg = self.config()?;
        let genesis = GenesisInfo::new(cfg.network.clone(), json!({ "seed": cfg.seed }));
        tracing::info!(
            network = %cfg.network,
            seed = cfg.seed,
            items_per_round = cfg.items_per_round,
            tip = ?cfg.tip,
            "Synthetic source ready"
        );
        Ok(genesis)
    }

    async fn get_unit(&self, round: u64) -> Result<RoundUnit, PluginError> {
        let cfg = self.config()?;
        if let Some(tip) = cfg.tip.filter(|tip| round > *tip) {
            return Err(PluginError::unavailable(
                "AT_TIP",
                format!("round {round} is beyond the tip {tip}"),
            ));
        }
        if let Some(counter) = self.generated.get() {
            counter.inc();
        }
        Ok(source::generate(cfg, round))
    }
}

impl MetricsProvider for SyntheticSource {
    fn provide_collectors(&self) -> Vec<Box<dyn Collector>> {
        self.generated
            .get()
            .map(|c| Box::new(c.clone()) as Box<dyn Collector>)
            .into_iter()
            .collect()
    }
}

/// Register the `synthetic` source.
///
/// # Errors
///
/// Fails if the name is already registered.
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_source(NAME, || Arc::new(SyntheticSource::default()))
}
