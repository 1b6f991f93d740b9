//! `file` sink: one JSON document per round in the sink's data directory.
//!
//! Files are named `<round:012>.json` and written through a temp file plus
//! rename, so a reader never sees a partial round. A `last-round` marker
//! tracks the highest round written.

pub mod config;
pub mod sink;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use roundhouse_sdk::prelude::*;

/// Registry name.
pub const NAME: &str = "file";

#[derive(Debug)]
struct Target {
    dir: PathBuf,
    pretty: bool,
}

#[derive(Debug, Default)]
pub struct FileSink {
    target: OnceLock<Target>,
}

impl Plugin for FileSink {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(NAME, "Writes each round as a JSON file")
            .with_sample_config(config::SAMPLE_CONFIG)
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn init(
        &self,
        _ctx: &PluginContext,
        info: &InitInfo,
        config: PluginConfig,
    ) -> Result<(), PluginError> {
        let cfg: config::Config = config.decode()?;
        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .map_err(|e| PluginError::config("DATA_DIR", format!("{}: {e}", config.data_dir.display())))?;

        let last = sink::last_round(&config.data_dir).await?;
        tracing::info!(
            dir = %config.data_dir.display(),
            next_round = info.next_round,
            last_written = ?last,
            "File sink ready"
        );

        self.target
            .set(Target {
                dir: config.data_dir,
                pretty: cfg.pretty,
            })
            .map_err(|_| PluginError::internal("ALREADY_INITIALIZED", "init called twice"))
    }

    async fn receive(&self, unit: &RoundUnit) -> Result<(), PluginError> {
        let target = self
            .target
            .get()
            .ok_or_else(|| PluginError::internal("NOT_INITIALIZED", "file sink used before init"))?;
        let path = sink::write_round(&target.dir, unit, target.pretty).await?;
        tracing::trace!(round = unit.round(), path = %path.display(), "Round written");
        Ok(())
    }
}

/// Register the `file` sink.
///
/// # Errors
///
/// Fails if the name is already registered.
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_sink(NAME, || Arc::new(FileSink::default()))
}
