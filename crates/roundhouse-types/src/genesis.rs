//! Genesis identity and the read-only init view handed to transforms and sinks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Dataset-identifying bootstrap value returned by the source at init.
///
/// Its [`hash`](GenesisInfo::hash) is persisted in the checkpoint and compared
/// on every restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisInfo {
    /// Human-readable network identifier (e.g. `"mainnet"`).
    pub network: String,
    /// Source-defined genesis document.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl GenesisInfo {
    #[must_use]
    pub fn new(network: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            network: network.into(),
            payload,
        }
    }

    /// Lowercase hex SHA-256 of the canonical JSON encoding.
    ///
    /// `serde_json` maps are ordered, so equal values always hash equally.
    #[must_use]
    pub fn hash(&self) -> String {
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(&encoded))
    }
}

/// Read-only pipeline view passed to transform and sink init.
#[derive(Debug, Clone)]
pub struct InitInfo {
    pub genesis: Arc<GenesisInfo>,
    pub genesis_hash: String,
    pub network: String,
    /// First round the pipeline will request from the source.
    pub next_round: u64,
}

impl InitInfo {
    #[must_use]
    pub fn new(genesis: Arc<GenesisInfo>, next_round: u64) -> Self {
        Self {
            genesis_hash: genesis.hash(),
            network: genesis.network.clone(),
            genesis,
            next_round,
        }
    }
}
