use anyhow::Result;

use roundhouse_sdk::types::PluginRole;

use crate::registry;

/// Execute the `plugins` command: list built-in plugins per role.
pub fn execute() -> Result<()> {
    let registry = registry::builtin()?;

    for role in PluginRole::ALL {
        println!("{role}s:");
        for descriptor in registry.descriptors(role) {
            let deprecated = if descriptor.deprecated { "  [deprecated]" } else { "" };
            println!("  {:<12} {}{deprecated}", descriptor.name, descriptor.description);
        }
    }
    Ok(())
}
