//! Convenience re-exports for plugin authors.
//!
//! ```ignore
//! use roundhouse_sdk::prelude::*;
//! ```

// Plugin traits
pub use crate::plugin::{Completable, MetricsProvider, Plugin, Sink, Source, Transform};

// Context and registration
pub use crate::context::PluginContext;
pub use crate::registry::{Registry, RegistryError};
pub use async_trait::async_trait;

// Shared data model
pub use roundhouse_types::{
    ErrorCategory, GenesisInfo, InitInfo, PluginConfig, PluginDescriptor, PluginError,
    PluginRole, RoundUnit, UnitHeader, UnitItem,
};
