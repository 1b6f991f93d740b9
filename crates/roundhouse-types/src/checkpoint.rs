//! Persisted pipeline position.
//!
//! A [`Checkpoint`] is the only state the engine needs to resume after a
//! crash: which dataset it was following and which round comes next.

use serde::{Deserialize, Serialize};

use crate::genesis::GenesisInfo;

/// Durable record of pipeline progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Checkpoint {
    /// Hash of the genesis the pipeline was bootstrapped against.
    #[serde(default)]
    pub genesis_hash: String,
    #[serde(default)]
    pub network: String,
    /// Next round to request from the source.
    #[serde(default)]
    pub next_round: u64,
}

impl Checkpoint {
    /// Value used for a fresh data directory.
    #[must_use]
    pub fn bootstrap() -> Self {
        Self::default()
    }

    /// `true` until a genesis identity has been recorded.
    #[must_use]
    pub fn is_bootstrap(&self) -> bool {
        self.genesis_hash.is_empty()
    }

    /// Record the genesis identity, keeping the round untouched.
    pub fn adopt_genesis(&mut self, genesis: &GenesisInfo) {
        self.genesis_hash = genesis.hash();
        self.network = genesis.network.clone();
    }
}
