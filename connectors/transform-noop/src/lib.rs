//! `noop` transform: hands every unit to the next stage untouched.

use std::sync::Arc;

use roundhouse_sdk::prelude::*;

/// Registry name.
pub const NAME: &str = "noop";

#[derive(Debug, Default)]
pub struct NoopTransform;

impl Plugin for NoopTransform {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(NAME, "Passes units through unchanged")
    }
}

#[async_trait]
impl Transform for NoopTransform {
    async fn init(
        &self,
        _ctx: &PluginContext,
        _info: &InitInfo,
        _config: PluginConfig,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    async fn process(&self, unit: RoundUnit) -> Result<RoundUnit, PluginError> {
        Ok(unit)
    }
}

/// Register the `noop` transform.
///
/// # Errors
///
/// Fails if the name is already registered.
pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_transform(NAME, || Arc::new(NoopTransform))
}
