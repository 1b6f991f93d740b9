//! Deterministic unit generation.
//!
//! Every value is derived from `(seed, round, index)` with a splitmix64
//! mixer, so the same config always yields byte-identical rounds.

use roundhouse_sdk::types::{RoundUnit, UnitHeader, UnitItem};
use serde_json::json;

use crate::config::Config;

/// Item kinds, assigned round-robin by item index.
pub const KINDS: [&str; 3] = ["pay", "transfer", "call"];

/// Timestamp of round 0; later rounds are spaced [`ROUND_SECONDS`] apart.
const GENESIS_TIMESTAMP: i64 = 1_700_000_000;
const ROUND_SECONDS: i64 = 4;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Identifier of `round` under `seed`.
pub fn round_hash(seed: u64, round: u64) -> String {
    format!("{:016x}", splitmix64(seed ^ splitmix64(round)))
}

pub fn generate(config: &Config, round: u64) -> RoundUnit {
    let offset = i64::try_from(round)
        .unwrap_or(i64::MAX / ROUND_SECONDS)
        .saturating_mul(ROUND_SECONDS);
    let header = UnitHeader {
        round,
        timestamp: Some(GENESIS_TIMESTAMP.saturating_add(offset)),
        parent_hash: round
            .checked_sub(1)
            .map(|parent| round_hash(config.seed, parent)),
    };

    let items = (0..config.items_per_round)
        .map(|i| {
            let kind = KINDS[i as usize % KINDS.len()];
            let mixed = splitmix64(config.seed ^ splitmix64(round) ^ u64::from(i));
            UnitItem::new(
                kind,
                json!({
                    "id": format!("{round}-{i}"),
                    "amount": mixed % 1_000_000,
                }),
            )
        })
        .collect();

    RoundUnit {
        header,
        items,
        certificate: Some(json!({ "round": round, "hash": round_hash(config.seed, round) })),
        delta: None,
    }
}
