use anyhow::{Context, Result};
use roundhouse_sdk::Registry;

/// Registry holding every connector compiled into this binary.
pub fn builtin() -> Result<Registry> {
    let mut registry = Registry::new();
    roundhouse_source_synthetic::register(&mut registry).context("synthetic source")?;
    roundhouse_transform_noop::register(&mut registry).context("noop transform")?;
    roundhouse_sink_noop::register(&mut registry).context("noop sink")?;
    roundhouse_sink_file::register(&mut registry).context("file sink")?;
    Ok(registry)
}
