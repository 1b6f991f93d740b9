//! Pipeline lifecycle: `Constructed → Initialized → Running → Stopping → Stopped`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use roundhouse_sdk::{PluginContext, Registry};
use roundhouse_state::{CheckpointStore, FileCheckpointStore};
use roundhouse_types::{Checkpoint, GenesisInfo, InitInfo};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::types::PipelineConfig;
use crate::config::validator::validate_pipeline;
use crate::error::PipelineError;
use crate::metrics::{MetricsServer, PipelineMetrics};
use crate::profiling::{CpuProfiler, PidFile};
use crate::runner::{spawn_supervised, RoundRunner};
use crate::stages::{CompletionHook, Stages};
use crate::status::{PipelineHandle, PipelineState};

/// One source, its transforms and one sink, driven round by round.
///
/// ```no_run
/// # async fn demo(config: roundhouse_engine::PipelineConfig, registry: std::sync::Arc<roundhouse_sdk::Registry>) -> Result<(), roundhouse_engine::PipelineError> {
/// let mut pipeline = roundhouse_engine::Pipeline::new(config, registry);
/// pipeline.init().await?;
/// pipeline.start()?;
/// // ... later
/// pipeline.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    registry: Arc<Registry>,
    store: Arc<dyn CheckpointStore>,
    handle: PipelineHandle,
    cancel: CancellationToken,

    stages: Option<Arc<Stages>>,
    hooks: Arc<[CompletionHook]>,
    checkpoint: Option<Checkpoint>,
    metrics: Option<Arc<PipelineMetrics>>,
    metrics_server: Option<MetricsServer>,
    profiler: Option<CpuProfiler>,
    pid_file: Option<PidFile>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state())
            .field("source", &self.config.source.name)
            .field("sink", &self.config.sink.name)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline checkpointing to `metadata.json` in `config.data_dir`.
    #[must_use]
    pub fn new(config: PipelineConfig, registry: Arc<Registry>) -> Self {
        let store = Arc::new(FileCheckpointStore::new(&config.data_dir));
        Self {
            config,
            registry,
            store,
            handle: PipelineHandle::default(),
            cancel: CancellationToken::new(),
            stages: None,
            hooks: Arc::from(Vec::new()),
            checkpoint: None,
            metrics: None,
            metrics_server: None,
            profiler: None,
            pid_file: None,
            task: None,
        }
    }

    /// Replace the checkpoint store. Only meaningful before [`init`](Self::init).
    #[must_use]
    pub fn with_checkpoint_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.handle.state()
    }

    /// Last recorded error; `None` after a successful round.
    #[must_use]
    pub fn error(&self) -> Option<Arc<PipelineError>> {
        self.handle.error()
    }

    #[must_use]
    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    /// Bound address of the metrics listener, when metrics are enabled.
    #[must_use]
    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        self.metrics_server.as_ref().map(MetricsServer::addr)
    }

    #[must_use]
    pub fn metrics(&self) -> Option<&Arc<PipelineMetrics>> {
        self.metrics.as_ref()
    }

    fn expect_state(&self, operation: &'static str, expected: PipelineState) -> Result<(), PipelineError> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(PipelineError::Lifecycle { operation, state })
        }
    }

    /// Validate config, construct and initialise every plugin, reconcile the
    /// checkpoint and bring up the metrics surface.
    ///
    /// Not re-entrant: on failure the pipeline stays `Constructed`, and
    /// [`stop`](Self::stop) closes whatever was already constructed.
    ///
    /// # Errors
    ///
    /// Configuration, registry lookup, plugin init, genesis mismatch,
    /// persistence, metrics and profiling failures are all fatal here.
    pub async fn init(&mut self) -> Result<(), PipelineError> {
        self.expect_state("init", PipelineState::Constructed)?;
        if self.stages.is_some() {
            return Err(PipelineError::Lifecycle {
                operation: "re-init",
                state: self.state(),
            });
        }
        validate_pipeline(&self.config)?;
        tracing::info!(
            source = %self.config.source.name,
            transforms = self.config.transforms.len(),
            sink = %self.config.sink.name,
            data_dir = %self.config.data_dir.display(),
            "Initializing pipeline"
        );

        if let Some(path) = &self.config.cpu_profile {
            self.profiler = Some(CpuProfiler::start(path)?);
        }
        if let Some(path) = &self.config.pid_file_path {
            self.pid_file = Some(PidFile::create(path)?);
        }

        let stages = Arc::new(Stages::construct(&self.config, &self.registry)?);
        self.stages = Some(Arc::clone(&stages));
        stages.create_data_dirs()?;

        let ctx = PluginContext::new(self.cancel.clone());
        let genesis = Arc::new(stages.init_source(&ctx).await?);
        let checkpoint = self.reconcile_checkpoint(&genesis).await?;

        let info = InitInfo::new(Arc::clone(&genesis), checkpoint.next_round);
        stages.init_downstream(&ctx, &info).await?;

        self.hooks = stages.completion_hooks().into();
        tracing::debug!(hooks = self.hooks.len(), "Completion hooks recorded");

        if self.config.metrics.enabled() {
            let metrics = Arc::new(PipelineMetrics::new(&self.config.metrics.prefix)?);
            for (plugin, provider) in stages.metrics_providers() {
                for collector in provider.provide_collectors() {
                    metrics.register_collector(collector).map_err(|e| {
                        PipelineError::Metrics(format!("plugin '{plugin}' collector rejected: {e}"))
                    })?;
                }
            }
            let server = MetricsServer::bind(&self.config.metrics.addr, Arc::clone(&metrics)).await?;
            self.metrics = Some(metrics);
            self.metrics_server = Some(server);
        }

        self.handle.set_next_round(checkpoint.next_round);
        self.checkpoint = Some(checkpoint);
        self.handle.set_state(PipelineState::Initialized);
        tracing::info!(next_round = self.handle.next_round(), "Pipeline initialized");
        Ok(())
    }

    /// Load the checkpoint, bind it to `genesis` or verify it, then apply
    /// any configured round override. Every change is persisted before
    /// returning.
    async fn reconcile_checkpoint(&self, genesis: &GenesisInfo) -> Result<Checkpoint, PipelineError> {
        let mut checkpoint = self.load_checkpoint().await?;
        let live = genesis.hash();

        if checkpoint.is_bootstrap() {
            checkpoint.adopt_genesis(genesis);
            tracing::info!(
                genesis_hash = %checkpoint.genesis_hash,
                network = %checkpoint.network,
                next_round = checkpoint.next_round,
                "Bootstrapped checkpoint"
            );
            self.save_checkpoint(&checkpoint).await?;
        } else if checkpoint.genesis_hash != live {
            return Err(PipelineError::GenesisMismatch {
                persisted: checkpoint.genesis_hash,
                live,
            });
        }

        if let Some(round) = self.config.round_override {
            tracing::info!(
                from = checkpoint.next_round,
                to = round,
                "Overriding next round"
            );
            checkpoint.next_round = round;
            self.save_checkpoint(&checkpoint).await?;
        }
        Ok(checkpoint)
    }

    async fn load_checkpoint(&self) -> Result<Checkpoint, PipelineError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| PipelineError::Fatal(format!("checkpoint load task failed: {e}")))?
            .map_err(PipelineError::from)
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), PipelineError> {
        let store = Arc::clone(&self.store);
        let checkpoint = checkpoint.clone();
        tokio::task::spawn_blocking(move || store.save(&checkpoint))
            .await
            .map_err(|e| PipelineError::Fatal(format!("checkpoint save task failed: {e}")))?
            .map_err(PipelineError::from)
    }

    /// Launch the round loop in the background and return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Lifecycle`] unless the pipeline is `Initialized`.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        self.expect_state("start", PipelineState::Initialized)?;
        let (Some(stages), Some(checkpoint)) = (self.stages.clone(), self.checkpoint.clone()) else {
            return Err(PipelineError::Lifecycle {
                operation: "start",
                state: self.state(),
            });
        };

        let runner = RoundRunner {
            stages,
            hooks: Arc::clone(&self.hooks),
            store: Arc::clone(&self.store),
            checkpoint,
            handle: self.handle.clone(),
            metrics: self.metrics.clone(),
            cancel: self.cancel.clone(),
            retry_delay: Duration::from_millis(self.config.retry_delay_ms),
        };
        self.task = Some(spawn_supervised(runner));
        self.handle.set_state(PipelineState::Running);
        tracing::info!(next_round = self.handle.next_round(), "Pipeline started");
        Ok(())
    }

    /// Resolve once the round loop has exited, whether through
    /// [`stop`](Self::stop) or a fatal fault. Returns immediately if the loop
    /// was never started. Safe to drop mid-wait.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Pipeline supervisor ended abnormally");
            }
            self.task = None;
        }
    }

    /// Cancel the loop, wait for it, release profiling and the PID marker,
    /// then close Source, Transforms and Sink in that order.
    ///
    /// Close failures are logged and never abort the remaining closes.
    /// Stopping an already stopped pipeline is a no-op.
    pub async fn stop(&mut self) -> Result<(), PipelineError> {
        if self.state() == PipelineState::Stopped {
            return Ok(());
        }
        tracing::info!(state = %self.state(), "Stopping pipeline");
        self.handle.set_state(PipelineState::Stopping);

        self.cancel.cancel();
        self.wait().await;

        if let Some(profiler) = self.profiler.take() {
            if let Err(e) = profiler.finish() {
                tracing::error!(error = %e, "Failed to write CPU profile");
            }
        }
        if let Some(pid_file) = self.pid_file.take() {
            pid_file.remove();
        }

        if let Some(stages) = self.stages.take() {
            let failures = stages.close_all().await;
            if !failures.is_empty() {
                tracing::warn!(failures = failures.len(), "Some plugins failed to close");
            }
        }

        if let Some(server) = self.metrics_server.take() {
            server.shutdown().await;
        }

        self.handle.set_state(PipelineState::Stopped);
        tracing::info!(next_round = self.handle.next_round(), "Pipeline stopped");
        Ok(())
    }
}
