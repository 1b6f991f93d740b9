//! Resolved plugin instances and their Init/Close sequencing.

use std::sync::Arc;

use roundhouse_sdk::{Completable, MetricsProvider, PluginContext, Registry, Sink, Source, Transform};
use roundhouse_types::{GenesisInfo, InitInfo, PluginConfig, PluginRole};

use crate::config::types::PipelineConfig;
use crate::error::PipelineError;

/// A plugin instance plus the names it is reported under.
pub(crate) struct Slot<T: ?Sized> {
    pub name: String,
    /// Label used for the stage latency series.
    pub label: String,
    pub plugin: Arc<T>,
    pub config: PluginConfig,
}

pub(crate) struct CompletionHook {
    pub plugin: String,
    pub hook: Arc<dyn Completable>,
}

pub(crate) struct Stages {
    pub source: Slot<dyn Source>,
    pub transforms: Vec<Slot<dyn Transform>>,
    pub sink: Slot<dyn Sink>,
}

impl Stages {
    /// Resolve and construct every configured plugin. No plugin code beyond
    /// the constructors runs here.
    pub(crate) fn construct(config: &PipelineConfig, registry: &Registry) -> Result<Self, PipelineError> {
        let source = Slot {
            name: config.source.name.clone(),
            label: "source".to_string(),
            plugin: registry.resolve_source(&config.source.name)?(),
            config: PluginConfig::new(config.source.config.clone(), config.source_data_dir()),
        };

        let transforms = config
            .transforms
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Ok(Slot {
                    name: t.name.clone(),
                    label: format!("transform_{i}_{}", t.name),
                    plugin: registry.resolve_transform(&t.name)?(),
                    config: PluginConfig::new(t.config.clone(), config.transform_data_dir(i)),
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let sink = Slot {
            name: config.sink.name.clone(),
            label: "sink".to_string(),
            plugin: registry.resolve_sink(&config.sink.name)?(),
            config: PluginConfig::new(config.sink.config.clone(), config.sink_data_dir()),
        };

        Ok(Self {
            source,
            transforms,
            sink,
        })
    }

    fn data_dirs(&self) -> impl Iterator<Item = &std::path::Path> {
        std::iter::once(self.source.config.data_dir.as_path())
            .chain(self.transforms.iter().map(|t| t.config.data_dir.as_path()))
            .chain(std::iter::once(self.sink.config.data_dir.as_path()))
    }

    pub(crate) fn create_data_dirs(&self) -> Result<(), PipelineError> {
        for dir in self.data_dirs() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub(crate) async fn init_source(&self, ctx: &PluginContext) -> Result<GenesisInfo, PipelineError> {
        let slot = &self.source;
        let genesis = slot
            .plugin
            .init(ctx, slot.config.clone())
            .await
            .map_err(|source| PipelineError::PluginInit {
                role: PluginRole::Source,
                name: slot.name.clone(),
                source,
            })?;
        tracing::info!(plugin = %slot.name, network = %genesis.network, "Source initialized");
        Ok(genesis)
    }

    /// Init every transform in configured order, then the sink.
    pub(crate) async fn init_downstream(&self, ctx: &PluginContext, info: &InitInfo) -> Result<(), PipelineError> {
        for slot in &self.transforms {
            slot.plugin
                .init(ctx, info, slot.config.clone())
                .await
                .map_err(|source| PipelineError::PluginInit {
                    role: PluginRole::Transform,
                    name: slot.name.clone(),
                    source,
                })?;
            tracing::info!(plugin = %slot.name, "Transform initialized");
        }

        let slot = &self.sink;
        slot.plugin
            .init(ctx, info, slot.config.clone())
            .await
            .map_err(|source| PipelineError::PluginInit {
                role: PluginRole::Sink,
                name: slot.name.clone(),
                source,
            })?;
        tracing::info!(plugin = %slot.name, "Sink initialized");
        Ok(())
    }

    /// Completion hooks in Source, Transforms, Sink order.
    pub(crate) fn completion_hooks(&self) -> Vec<CompletionHook> {
        let mut hooks = Vec::new();
        let mut push = |name: &str, hook: Option<Arc<dyn Completable>>| {
            if let Some(hook) = hook {
                hooks.push(CompletionHook {
                    plugin: name.to_string(),
                    hook,
                });
            }
        };
        push(&self.source.name, self.source.plugin.clone().as_completable());
        for slot in &self.transforms {
            push(&slot.name, slot.plugin.clone().as_completable());
        }
        push(&self.sink.name, self.sink.plugin.clone().as_completable());
        hooks
    }

    /// Metrics providers in Source, Transforms, Sink order.
    pub(crate) fn metrics_providers(&self) -> Vec<(String, Arc<dyn MetricsProvider>)> {
        let mut providers = Vec::new();
        if let Some(p) = self.source.plugin.clone().as_metrics_provider() {
            providers.push((self.source.name.clone(), p));
        }
        for slot in &self.transforms {
            if let Some(p) = slot.plugin.clone().as_metrics_provider() {
                providers.push((slot.name.clone(), p));
            }
        }
        if let Some(p) = self.sink.plugin.clone().as_metrics_provider() {
            providers.push((self.sink.name.clone(), p));
        }
        providers
    }

    pub(crate) fn transform_labels(&self) -> Vec<String> {
        self.transforms.iter().map(|t| t.label.clone()).collect()
    }

    /// Close Source, then each Transform, then Sink. Failures are logged and
    /// returned; they never stop the remaining closes.
    pub(crate) async fn close_all(&self) -> Vec<PipelineError> {
        let mut failures = Vec::new();
        let mut record = |role: PluginRole, name: &str, result: Result<(), roundhouse_types::PluginError>| {
            match result {
                Ok(()) => tracing::debug!(role = %role, plugin = %name, "Plugin closed"),
                Err(source) => {
                    tracing::warn!(role = %role, plugin = %name, error = %source, "Plugin close failed");
                    failures.push(PipelineError::Shutdown {
                        role,
                        name: name.to_string(),
                        source,
                    });
                }
            }
        };

        record(PluginRole::Source, &self.source.name, self.source.plugin.close().await);
        for slot in &self.transforms {
            record(PluginRole::Transform, &slot.name, slot.plugin.close().await);
        }
        record(PluginRole::Sink, &self.sink.name, self.sink.plugin.close().await);
        failures
    }
}
