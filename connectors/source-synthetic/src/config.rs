use roundhouse_sdk::types::PluginError;
use serde::Deserialize;

/// Synthetic source config from pipeline YAML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_network")]
    pub network: String,
    /// Mixed into every generated value; a different seed is a different genesis.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_items_per_round")]
    pub items_per_round: u32,
    /// Highest round that exists. Later rounds answer `unavailable`.
    #[serde(default)]
    pub tip: Option<u64>,
}

fn default_network() -> String {
    "synthnet".to_string()
}

fn default_items_per_round() -> u32 {
    3
}

pub const MAX_ITEMS_PER_ROUND: u32 = 100_000;

impl Config {
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.network.trim().is_empty() {
            return Err(PluginError::config(
                "INVALID_CONFIG",
                "network must not be empty",
            ));
        }
        if self.items_per_round > MAX_ITEMS_PER_ROUND {
            return Err(PluginError::config(
                "INVALID_CONFIG",
                format!(
                    "items_per_round {} exceeds the maximum of {MAX_ITEMS_PER_ROUND}",
                    self.items_per_round
                ),
            ));
        }
        Ok(())
    }
}

pub const SAMPLE_CONFIG: &str = "\
network: synthnet
seed: 0
items_per_round: 3
# tip: 1000
";
