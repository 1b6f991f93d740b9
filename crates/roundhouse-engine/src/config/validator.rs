//! Semantic validation for parsed pipeline configuration values.

use std::net::SocketAddr;

use crate::config::types::{NamedConfig, PipelineConfig, CONFIG_VERSION};
use crate::error::PipelineError;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

fn validate_plugin(plugin: &NamedConfig, context: &str, errors: &mut Vec<String>) {
    let name = plugin.name.trim();
    if name.is_empty() {
        errors.push(format!("{context}: plugin name must not be empty"));
    } else if name.contains(['/', '\\']) {
        errors.push(format!(
            "{context}: plugin name '{}' must not contain path separators",
            plugin.name
        ));
    }
}

/// Validate a parsed pipeline configuration.
///
/// # Errors
///
/// Returns [`PipelineError::Configuration`] listing every problem found.
pub fn validate_pipeline(config: &PipelineConfig) -> Result<(), PipelineError> {
    let mut errors = Vec::new();

    if config.version != CONFIG_VERSION {
        errors.push(format!(
            "Unsupported pipeline version '{}', expected '{CONFIG_VERSION}'",
            config.version
        ));
    }

    if config.data_dir.as_os_str().is_empty() {
        errors.push("data_dir must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        errors.push(format!(
            "log_level '{}' must be one of {}",
            config.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    validate_plugin(&config.source, "source", &mut errors);
    for (i, transform) in config.transforms.iter().enumerate() {
        validate_plugin(transform, &format!("transforms[{i}]"), &mut errors);
    }
    validate_plugin(&config.sink, "sink", &mut errors);

    if config.metrics.enabled() {
        if config.metrics.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "metrics.addr '{}' is not a valid socket address",
                config.metrics.addr
            ));
        }
        let prefix_ok = config
            .metrics
            .prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !config.metrics.prefix.starts_with(|c: char| c.is_ascii_digit());
        if !prefix_ok {
            errors.push(format!(
                "metrics.prefix '{}' may only contain [a-zA-Z0-9_] and must not start with a digit",
                config.metrics.prefix
            ));
        }
    }

    if config.round_override == Some(u64::MAX) {
        errors.push(format!(
            "round_override must be below {}; no round can follow it",
            u64::MAX
        ));
    }

    if config.cpu_profile.is_some() && !cfg!(feature = "cpu-profile") {
        errors.push(
            "cpu_profile requires roundhouse to be built with the 'cpu-profile' feature"
                .to_string(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Configuration(errors))
    }
}
