//! Shared roundhouse data model.
//!
//! Everything that crosses the boundary between the engine and a plugin lives
//! here: the round-numbered [`RoundUnit`](unit::RoundUnit), genesis identity,
//! the persisted [`Checkpoint`](checkpoint::Checkpoint), plugin descriptors and
//! the structured [`PluginError`](error::PluginError).

pub mod checkpoint;
pub mod error;
pub mod genesis;
pub mod plugin;
pub mod unit;

pub use checkpoint::Checkpoint;
pub use error::{ErrorCategory, PluginError};
pub use genesis::{GenesisInfo, InitInfo};
pub use plugin::{PluginConfig, PluginDescriptor, PluginRole};
pub use unit::{RoundUnit, UnitHeader, UnitItem};
