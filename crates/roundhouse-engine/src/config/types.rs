//! Pipeline configuration types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config schema version accepted by the validator.
pub const CONFIG_VERSION: &str = "1.0";

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_metrics_addr() -> String {
    "127.0.0.1:9999".to_string()
}

fn default_metrics_prefix() -> String {
    "roundhouse".to_string()
}

/// Top-level pipeline configuration (parsed from YAML).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_version")]
    pub version: String,
    /// Holds `metadata.json` and one private subdirectory per plugin.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub source: NamedConfig,
    #[serde(default)]
    pub transforms: Vec<NamedConfig>,
    pub sink: NamedConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Pause between failed round attempts. Zero retries immediately.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub cpu_profile: Option<PathBuf>,
    #[serde(default)]
    pub pid_file_path: Option<PathBuf>,
    /// Forces the next round after genesis reconciliation.
    #[serde(default)]
    pub round_override: Option<u64>,
}

impl PipelineConfig {
    /// Minimal config with every optional setting at its default.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, source: NamedConfig, sink: NamedConfig) -> Self {
        Self {
            version: default_version(),
            data_dir: data_dir.into(),
            log_level: default_log_level(),
            source,
            transforms: Vec::new(),
            sink,
            metrics: MetricsConfig::default(),
            retry_delay_ms: default_retry_delay_ms(),
            cpu_profile: None,
            pid_file_path: None,
            round_override: None,
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: NamedConfig) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Private data directory of the source plugin.
    #[must_use]
    pub fn source_data_dir(&self) -> PathBuf {
        self.data_dir.join(format!("source_{}", self.source.name))
    }

    /// Private data directory of the transform at `index`.
    #[must_use]
    pub fn transform_data_dir(&self, index: usize) -> PathBuf {
        let name = self
            .transforms
            .get(index)
            .map_or("unknown", |t| t.name.as_str());
        self.data_dir.join(format!("transform_{index}_{name}"))
    }

    #[must_use]
    pub fn sink_data_dir(&self) -> PathBuf {
        self.data_dir.join(format!("sink_{}", self.sink.name))
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// A plugin selected by registry name plus its opaque config blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedConfig {
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

impl NamedConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsMode {
    #[default]
    Off,
    On,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub mode: MetricsMode,
    /// Listen address; port 0 binds an ephemeral port.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
    /// Namespace prepended to every engine series.
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            mode: MetricsMode::Off,
            addr: default_metrics_addr(),
            prefix: default_metrics_prefix(),
        }
    }
}

impl MetricsConfig {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.mode == MetricsMode::On
    }
}
