//! Plugin descriptors, roles and configuration blobs.

use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// The three mandatory pipeline roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginRole {
    Source,
    Transform,
    Sink,
}

impl PluginRole {
    pub const ALL: [PluginRole; 3] = [Self::Source, Self::Transform, Self::Sink];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Transform => "transform",
            Self::Sink => "sink",
        }
    }
}

impl fmt::Display for PluginRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description returned by every plugin instance.
///
/// Used for discovery and documentation only; the engine never branches on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub deprecated: bool,
    /// YAML snippet showing the plugin's configuration keys.
    #[serde(default)]
    pub sample_config: String,
}

impl PluginDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            deprecated: false,
            sample_config: String::new(),
        }
    }

    #[must_use]
    pub fn with_sample_config(mut self, sample: impl Into<String>) -> Self {
        self.sample_config = sample.into();
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Configuration handed to a plugin's `init`.
///
/// The engine never interprets `config`; each plugin decodes its own blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
    pub config: serde_json::Value,
    /// Private directory assigned to this plugin instance.
    pub data_dir: PathBuf,
}

impl PluginConfig {
    #[must_use]
    pub fn new(config: serde_json::Value, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            data_dir: data_dir.into(),
        }
    }

    /// Decode the blob into the plugin's config type. A `null` blob decodes
    /// as an empty map so that all-default configs need no YAML at all.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginError`] with category `config` if the blob does not
    /// match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
        let value = if self.config.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            self.config.clone()
        };
        serde_json::from_value(value)
            .map_err(|e| PluginError::config("INVALID_CONFIG", format!("Config parse error: {e}")))
    }
}
