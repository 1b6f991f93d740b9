//! Name → constructor registry for each plugin role.
//!
//! A [`Registry`] is an ordinary value: build it once at process start (each
//! connector crate exposes a `register` function), wrap it in an `Arc` and
//! share it with every pipeline. It holds no per-pipeline state, so any
//! number of pipelines can resolve from it concurrently. Tests build their
//! own isolated registries.

use std::collections::BTreeMap;
use std::sync::Arc;

use roundhouse_types::{PluginDescriptor, PluginRole};

use crate::plugin::{Plugin, Sink, Source, Transform};

/// Creates a fresh, unconfigured plugin instance.
pub type Constructor<T> = Arc<dyn Fn() -> Arc<T> + Send + Sync>;

/// Registry lookup and registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no {role} plugin named '{name}' is registered")]
    NotFound { role: PluginRole, name: String },

    #[error("a {role} plugin named '{name}' is already registered")]
    Duplicate { role: PluginRole, name: String },
}

struct Table<T: ?Sized> {
    role: PluginRole,
    entries: BTreeMap<String, Constructor<T>>,
}

impl<T: Plugin + ?Sized> Table<T> {
    fn new(role: PluginRole) -> Self {
        Self {
            role,
            entries: BTreeMap::new(),
        }
    }

    fn insert(&mut self, name: String, ctor: Constructor<T>) -> Result<(), RegistryError> {
        if self.entries.contains_key(&name) {
            return Err(RegistryError::Duplicate {
                role: self.role,
                name,
            });
        }
        tracing::debug!(role = %self.role, plugin = %name, "Registered plugin");
        self.entries.insert(name, ctor);
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<Constructor<T>, RegistryError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                role: self.role,
                name: name.to_string(),
            })
    }

    fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.entries.values().map(|ctor| ctor().descriptor()).collect()
    }
}

/// Append-only plugin registry, one table per role.
pub struct Registry {
    sources: Table<dyn Source>,
    transforms: Table<dyn Transform>,
    sinks: Table<dyn Sink>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("sources", &self.names(PluginRole::Source))
            .field("transforms", &self.names(PluginRole::Transform))
            .field("sinks", &self.names(PluginRole::Sink))
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Table::new(PluginRole::Source),
            transforms: Table::new(PluginRole::Transform),
            sinks: Table::new(PluginRole::Sink),
        }
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if `name` is already taken.
    pub fn register_source<F>(&mut self, name: impl Into<String>, ctor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Arc<dyn Source> + Send + Sync + 'static,
    {
        self.sources.insert(name.into(), Arc::new(ctor))
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if `name` is already taken.
    pub fn register_transform<F>(
        &mut self,
        name: impl Into<String>,
        ctor: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> Arc<dyn Transform> + Send + Sync + 'static,
    {
        self.transforms.insert(name.into(), Arc::new(ctor))
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if `name` is already taken.
    pub fn register_sink<F>(&mut self, name: impl Into<String>, ctor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Arc<dyn Sink> + Send + Sync + 'static,
    {
        self.sinks.insert(name.into(), Arc::new(ctor))
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no source is registered as `name`.
    pub fn resolve_source(&self, name: &str) -> Result<Constructor<dyn Source>, RegistryError> {
        self.sources.resolve(name)
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no transform is registered as `name`.
    pub fn resolve_transform(
        &self,
        name: &str,
    ) -> Result<Constructor<dyn Transform>, RegistryError> {
        self.transforms.resolve(name)
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no sink is registered as `name`.
    pub fn resolve_sink(&self, name: &str) -> Result<Constructor<dyn Sink>, RegistryError> {
        self.sinks.resolve(name)
    }

    /// Registered names for `role`, sorted.
    #[must_use]
    pub fn names(&self, role: PluginRole) -> Vec<&str> {
        match role {
            PluginRole::Source => self.sources.entries.keys().map(String::as_str).collect(),
            PluginRole::Transform => self.transforms.entries.keys().map(String::as_str).collect(),
            PluginRole::Sink => self.sinks.entries.keys().map(String::as_str).collect(),
        }
    }

    /// Descriptors of every plugin registered for `role`, sorted by
    /// registration name. Builds one throwaway instance per entry.
    #[must_use]
    pub fn descriptors(&self, role: PluginRole) -> Vec<PluginDescriptor> {
        match role {
            PluginRole::Source => self.sources.descriptors(),
            PluginRole::Transform => self.transforms.descriptors(),
            PluginRole::Sink => self.sinks.descriptors(),
        }
    }
}
