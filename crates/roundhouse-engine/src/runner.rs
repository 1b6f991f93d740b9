//! The round loop.
//!
//! One attempt at round `N` is: fetch from the source, thread through every
//! transform, hand to the sink. Only when all three succeed does the loop
//! persist `N + 1`, after which completion hooks run against the exported
//! unit. Failures retry in place; cancellation is checked before every
//! attempt and every pause.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use roundhouse_state::CheckpointStore;
use roundhouse_types::{Checkpoint, RoundUnit};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Stage, StageError};
use crate::metrics::{PipelineMetrics, RoundTimings};
use crate::stages::{CompletionHook, Stages};
use crate::status::{PipelineHandle, PipelineState};

/// Rounds between `info`-level progress lines.
const PROGRESS_INTERVAL: u64 = 1000;

pub(crate) struct RoundRunner {
    pub stages: Arc<Stages>,
    pub hooks: Arc<[CompletionHook]>,
    pub store: Arc<dyn CheckpointStore>,
    pub checkpoint: Checkpoint,
    pub handle: PipelineHandle,
    pub metrics: Option<Arc<PipelineMetrics>>,
    pub cancel: CancellationToken,
    pub retry_delay: Duration,
}

impl RoundRunner {
    pub(crate) async fn run(mut self) {
        tracing::info!(round = self.checkpoint.next_round, "Round loop started");
        let transform_labels = self.stages.transform_labels();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let round = self.checkpoint.next_round;
            let Some(next_round) = round.checked_add(1) else {
                halt(
                    &self.handle,
                    &self.cancel,
                    format!("round {round} is the last representable round and cannot be checkpointed past"),
                );
                break;
            };
            let (unit, mut timings) = match self.export_round(round).await {
                Ok(exported) => exported,
                Err(err) => {
                    self.fail_attempt(err);
                    self.pause().await;
                    continue;
                }
            };

            self.checkpoint.next_round = next_round;
            self.handle.set_next_round(next_round);
            self.persist().await;

            let Some(complete) = self.complete_round(&unit).await else {
                tracing::warn!(round, "Stopped before completion hooks succeeded");
                break;
            };
            timings.complete = complete;

            self.handle.complete_round();
            if let Some(metrics) = &self.metrics {
                metrics.observe_round(&unit, &timings, &transform_labels);
            }
            if round % PROGRESS_INTERVAL == 0 {
                tracing::info!(round, items = unit.items.len(), "Round complete");
            } else {
                tracing::debug!(
                    round,
                    items = unit.items.len(),
                    elapsed_ms = timings.total().as_millis(),
                    "Round complete"
                );
            }
        }

        tracing::info!(next_round = self.checkpoint.next_round, "Round loop stopped");
    }

    async fn export_round(&self, round: u64) -> Result<(RoundUnit, RoundTimings), StageError> {
        let mut timings = RoundTimings::default();
        let stages = &self.stages;

        let started = Instant::now();
        let mut unit = stages
            .source
            .plugin
            .get_unit(round)
            .await
            .map_err(|e| StageError::new(Stage::Source, &stages.source.name, round, e))?;
        if unit.round() != round {
            return Err(StageError::round_mismatch(&stages.source.name, round, unit.round()));
        }
        timings.source = started.elapsed();

        for (i, slot) in stages.transforms.iter().enumerate() {
            let started = Instant::now();
            unit = slot
                .plugin
                .process(unit)
                .await
                .map_err(|e| StageError::new(Stage::Transform(i), &slot.name, round, e))?;
            timings.transforms.push(started.elapsed());
        }

        let started = Instant::now();
        stages
            .sink
            .plugin
            .receive(&unit)
            .await
            .map_err(|e| StageError::new(Stage::Sink, &stages.sink.name, round, e))?;
        timings.sink = started.elapsed();

        Ok((unit, timings))
    }

    /// Run every hook until one full pass succeeds. Returns `None` if the
    /// pipeline is stopped first.
    async fn complete_round(&self, unit: &RoundUnit) -> Option<Duration> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            let started = Instant::now();
            match self.run_hooks(unit).await {
                Ok(()) => return Some(started.elapsed()),
                Err(err) => {
                    self.fail_attempt(err);
                    self.pause().await;
                }
            }
        }
    }

    async fn run_hooks(&self, unit: &RoundUnit) -> Result<(), StageError> {
        for hook in self.hooks.iter() {
            hook.hook
                .on_complete(unit)
                .await
                .map_err(|e| StageError::new(Stage::Complete, &hook.plugin, unit.round(), e))?;
        }
        Ok(())
    }

    fn fail_attempt(&self, err: StageError) {
        let retry_count = self.handle.bump_retry();
        tracing::warn!(
            round = err.round,
            stage = %err.stage,
            plugin = %err.plugin,
            retry_count,
            error = %err.source,
            "Round attempt failed, retrying"
        );
        if let Some(metrics) = &self.metrics {
            metrics.set_retry_count(retry_count);
        }
        self.handle.record_error(Some(PipelineError::Stage(err)));
    }

    /// Save the advanced checkpoint. A failure is logged and counted; the
    /// round still counts as complete.
    async fn persist(&self) {
        let store = Arc::clone(&self.store);
        let checkpoint = self.checkpoint.clone();
        let result = tokio::task::spawn_blocking(move || store.save(&checkpoint)).await;

        let error = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(join_err) => format!("checkpoint save task panicked: {join_err}"),
        };
        let failures = self.handle.note_persistence_failure();
        tracing::error!(
            next_round = self.checkpoint.next_round,
            failures,
            error = %error,
            "Failed to persist checkpoint"
        );
    }

    async fn pause(&self) {
        if self.retry_delay.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            () = self.cancel.cancelled() => {}
            () = tokio::time::sleep(self.retry_delay) => {}
        }
    }
}

/// Run `runner` on its own task and watch it from a second one.
///
/// A panic inside the loop is recorded as [`PipelineError::Fatal`], moves the
/// pipeline to `Stopping` and fires `cancel`. Plugins stay open until
/// [`Pipeline::stop`](crate::Pipeline::stop).
pub(crate) fn spawn_supervised(runner: RoundRunner) -> JoinHandle<()> {
    let handle = runner.handle.clone();
    let cancel = runner.cancel.clone();
    let loop_task = tokio::spawn(runner.run());

    tokio::spawn(async move {
        match loop_task.await {
            Ok(()) => {}
            Err(join_err) if join_err.is_panic() => {
                let message = panic_message(join_err.into_panic().as_ref());
                halt(&handle, &cancel, message);
            }
            Err(join_err) => {
                tracing::warn!(error = %join_err, "Round loop task cancelled");
            }
        }
    })
}

/// Record a fatal error and leave the loop for good.
fn halt(handle: &PipelineHandle, cancel: &CancellationToken, message: String) {
    tracing::error!(error = %message, "Round loop halted");
    handle.record_error(Some(PipelineError::Fatal(message)));
    handle.set_state(PipelineState::Stopping);
    cancel.cancel();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "round loop panicked".to_string()
    }
}
