use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use roundhouse_engine::config::{parser, validator};
use roundhouse_engine::{Pipeline, PipelineError};

use crate::{logging, registry};

/// Execute the `run` command: parse, validate, init, then run until Ctrl-C
/// or until the round loop ends on its own.
pub async fn execute(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    next_round: Option<u64>,
    log_level: Option<&str>,
) -> Result<()> {
    let mut config = parser::parse_pipeline(config_path)
        .with_context(|| format!("Failed to parse pipeline: {}", config_path.display()))?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if next_round.is_some() {
        config.round_override = next_round;
    }

    logging::init(log_level.unwrap_or(&config.log_level));
    validator::validate_pipeline(&config)?;

    tracing::info!(
        source = %config.source.name,
        transforms = config.transforms.len(),
        sink = %config.sink.name,
        "Pipeline validated"
    );

    let registry = Arc::new(registry::builtin()?);
    let mut pipeline = Pipeline::new(config, registry);

    if let Err(e) = pipeline.init().await {
        pipeline.stop().await?;
        return Err(e).context("Failed to initialize pipeline");
    }
    pipeline.start()?;
    if let Some(addr) = pipeline.metrics_addr() {
        println!("Serving metrics on http://{addr}/metrics");
    }

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Interrupt received");
        }
        () = pipeline.wait() => {
            tracing::warn!("Round loop ended without a stop request");
        }
    }

    pipeline.stop().await?;

    let handle = pipeline.handle();
    println!("Pipeline stopped.");
    println!("  Next round:       {}", handle.next_round());
    println!("  Rounds completed: {}", handle.rounds_completed());
    if handle.persistence_failures() > 0 {
        println!("  Failed saves:     {}", handle.persistence_failures());
    }

    match pipeline.error().as_deref() {
        Some(err @ PipelineError::Fatal(_)) => anyhow::bail!("{err}"),
        Some(err) => {
            println!("  Last error:       {err}");
            Ok(())
        }
        None => Ok(()),
    }
}
