//! The unit of work threaded through a pipeline.
//!
//! A [`RoundUnit`] is produced by the source for exactly one round, passed
//! through every transform in order, and handed to the sink. The engine only
//! reads the round number (from the header) and the item kinds (for metrics);
//! everything else is opaque to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header metadata of a round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitHeader {
    /// Round number this unit belongs to.
    pub round: u64,
    /// Upstream timestamp (seconds since the epoch), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Identifier of the previous round, when the upstream chains rounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<String>,
}

/// One item of round content (a transaction, an event, a row...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitItem {
    /// Category label used for per-round item counts.
    pub kind: String,
    pub body: serde_json::Value,
}

impl UnitItem {
    #[must_use]
    pub fn new(kind: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            body,
        }
    }
}

/// Round-numbered payload passed between stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundUnit {
    pub header: UnitHeader,
    #[serde(default)]
    pub items: Vec<UnitItem>,
    /// Side-channel certificate attesting the round, if the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<serde_json::Value>,
    /// Side-channel state delta produced by applying the round, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<serde_json::Value>,
}

impl RoundUnit {
    /// Empty unit for `round`.
    #[must_use]
    pub fn empty(round: u64) -> Self {
        Self {
            header: UnitHeader {
                round,
                ..UnitHeader::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn round(&self) -> u64 {
        self.header.round
    }

    /// Number of items per kind, sorted by kind.
    #[must_use]
    pub fn item_counts(&self) -> BTreeMap<&str, u64> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.kind.as_str()).or_insert(0) += 1;
        }
        counts
    }
}
