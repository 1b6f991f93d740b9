mod http;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use roundhouse_engine::config::{parser, validator};
use roundhouse_engine::{Pipeline, PipelineConfig};
use roundhouse_state::{CheckpointStore, FileCheckpointStore};
use roundhouse_types::{Checkpoint, RoundUnit};

pub use connectors::builtin_registry;
pub use http::scrape;

const RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// An isolated pipeline data directory.
#[derive(Debug)]
pub struct HarnessContext {
    dir: tempfile::TempDir,
}

/// Knobs for the generated pipeline YAML.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub network: String,
    pub seed: u64,
    pub items_per_round: u32,
    pub tip: u64,
    pub transforms: usize,
    pub sink: SinkKind,
    pub metrics: bool,
    pub round_override: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Noop,
    File { pretty: bool },
}

impl Default for PipelineSpec {
    fn default() -> Self {
        Self {
            network: "e2enet".to_string(),
            seed: 1,
            items_per_round: 3,
            tip: 5,
            transforms: 0,
            sink: SinkKind::Noop,
            metrics: false,
            round_override: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub next_round: u64,
    pub rounds_completed: u64,
    pub persistence_failures: u64,
    /// `/metrics` body scraped just before stopping, when metrics were on.
    pub metrics: Option<String>,
}

pub fn bootstrap() -> Result<HarnessContext> {
    let dir = tempfile::tempdir().context("failed to create pipeline data dir")?;
    Ok(HarnessContext { dir })
}

impl HarnessContext {
    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn sink_dir(&self) -> PathBuf {
        self.data_dir().join("sink_file")
    }

    /// Render `spec` as pipeline YAML rooted at this context's data dir.
    pub fn pipeline_yaml(&self, spec: &PipelineSpec) -> String {
        let mut yaml = format!(
            "version: \"1.0\"\n\
             data_dir: {data_dir}\n\
             log_level: debug\n\
             retry_delay_ms: 5\n\
             source:\n  name: synthetic\n  config:\n    network: {network}\n    seed: {seed}\n    items_per_round: {items}\n    tip: {tip}\n",
            data_dir = self.data_dir().display(),
            network = spec.network,
            seed = spec.seed,
            items = spec.items_per_round,
            tip = spec.tip,
        );
        if spec.transforms > 0 {
            yaml.push_str("transforms:\n");
            for _ in 0..spec.transforms {
                yaml.push_str("  - name: noop\n");
            }
        }
        match spec.sink {
            SinkKind::Noop => yaml.push_str("sink:\n  name: noop\n"),
            SinkKind::File { pretty } => {
                yaml.push_str(&format!("sink:\n  name: file\n  config:\n    pretty: {pretty}\n"));
            }
        }
        if spec.metrics {
            yaml.push_str("metrics:\n  mode: \"on\"\n  addr: \"127.0.0.1:0\"\n  prefix: e2e\n");
        }
        if let Some(round) = spec.round_override {
            yaml.push_str(&format!("round_override: {round}\n"));
        }
        yaml
    }

    /// Write `spec` to disk and load it back through the parser and validator.
    pub fn load_config(&self, spec: &PipelineSpec) -> Result<PipelineConfig> {
        let path = self.data_dir().join("pipeline.yaml");
        std::fs::write(&path, self.pipeline_yaml(spec)).context("failed to write pipeline yaml")?;
        let config = parser::parse_pipeline(&path)?;
        validator::validate_pipeline(&config)?;
        Ok(config)
    }

    /// Run `spec` until the source reports its tip, then stop.
    pub async fn run_to_tip(&self, spec: &PipelineSpec) -> Result<RunSummary> {
        let config = self.load_config(spec)?;
        let mut pipeline = Pipeline::new(config, builtin_registry()?);

        if let Err(e) = pipeline.init().await {
            pipeline.stop().await?;
            return Err(e.into());
        }
        pipeline.start()?;

        let handle = pipeline.handle();
        let target = spec.tip + 1;
        let reached = tokio::time::timeout(RUN_TIMEOUT, async {
            while !(handle.next_round() >= target && handle.retry_count() > 0) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;

        let metrics = match pipeline.metrics_addr() {
            Some(addr) => Some(scrape(addr).await?),
            None => None,
        };
        pipeline.stop().await?;
        if reached.is_err() {
            bail!(
                "pipeline did not reach round {target} within {RUN_TIMEOUT:?} (at {})",
                handle.next_round()
            );
        }

        Ok(RunSummary {
            next_round: handle.next_round(),
            rounds_completed: handle.rounds_completed(),
            persistence_failures: handle.persistence_failures(),
            metrics,
        })
    }

    pub fn checkpoint(&self) -> Result<Checkpoint> {
        Ok(FileCheckpointStore::new(self.data_dir()).load()?)
    }

    /// Rounds written by the file sink, in round order.
    pub fn exported_rounds(&self) -> Result<Vec<RoundUnit>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(self.sink_dir())
            .context("file sink dir missing")?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        paths
            .iter()
            .map(|p| {
                let bytes = std::fs::read(p).with_context(|| format!("reading {}", p.display()))?;
                serde_json::from_slice(&bytes).with_context(|| format!("decoding {}", p.display()))
            })
            .collect()
    }
}
