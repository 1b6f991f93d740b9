//! Plugin contracts and the plugin registry.
//!
//! A pipeline is one [`Source`], any number of [`Transform`]s and one
//! [`Sink`]. Plugins may additionally opt into the [`Completable`] and
//! [`MetricsProvider`] capabilities by overriding the matching query on
//! [`Plugin`].

pub mod context;
pub mod plugin;
pub mod prelude;
pub mod registry;

pub use context::PluginContext;
pub use plugin::{Completable, MetricsProvider, Plugin, Sink, Source, Transform};
pub use registry::{Registry, RegistryError};

pub use async_trait::async_trait;
pub use prometheus;
pub use roundhouse_types as types;
