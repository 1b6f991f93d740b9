use std::path::Path;

use anyhow::{Context, Result};

use roundhouse_engine::config::{parser, validator};

use crate::registry;

/// Execute the `check` command: parse, validate and resolve every plugin
/// name without running any plugin code.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = parser::parse_pipeline(config_path)
        .with_context(|| format!("Failed to parse pipeline: {}", config_path.display()))?;
    validator::validate_pipeline(&config)?;

    let registry = registry::builtin()?;
    registry.resolve_source(&config.source.name)?;
    for transform in &config.transforms {
        registry.resolve_transform(&transform.name)?;
    }
    registry.resolve_sink(&config.sink.name)?;

    println!("Pipeline '{}' is valid.", config_path.display());
    println!("  Source:     {}", config.source.name);
    for (i, transform) in config.transforms.iter().enumerate() {
        println!("  Transform {i}: {}", transform.name);
    }
    println!("  Sink:       {}", config.sink.name);
    println!("  Data dir:   {}", config.data_dir.display());
    Ok(())
}
