use anyhow::{Context, Result};
use roundhouse_engine::{NamedConfig, PipelineConfig};
use roundhouse_sdk::types::PluginDescriptor;
use roundhouse_sdk::Registry;

use crate::registry;

/// Execute the `init` command: print a starter config to stdout.
pub fn execute(source: &str, transforms: &[String], sink: &str) -> Result<()> {
    let registry = registry::builtin()?;
    print!("{}", render(&registry, source, transforms, sink)?);
    Ok(())
}

fn named(descriptor: &PluginDescriptor) -> Result<NamedConfig> {
    let config = if descriptor.sample_config.trim().is_empty() {
        serde_json::Value::Null
    } else {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&descriptor.sample_config)
            .with_context(|| format!("Invalid sample config for '{}'", descriptor.name))?;
        serde_json::to_value(yaml)?
    };
    Ok(NamedConfig::new(descriptor.name.clone()).with_config(config))
}

/// Build a pipeline config from each plugin's sample config and render it
/// as YAML.
pub fn render(registry: &Registry, source: &str, transforms: &[String], sink: &str) -> Result<String> {
    let source = named(&registry.resolve_source(source)?().descriptor())?;
    let sink = named(&registry.resolve_sink(sink)?().descriptor())?;

    let mut config = PipelineConfig::new("./data", source, sink);
    for name in transforms {
        config = config.with_transform(named(&registry.resolve_transform(name)?().descriptor())?);
    }
    Ok(serde_yaml::to_string(&config)?)
}
