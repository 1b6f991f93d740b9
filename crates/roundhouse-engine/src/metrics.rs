//! Prometheus series for the round loop and the `/metrics` HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::core::Collector;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry, TextEncoder,
};
use roundhouse_types::RoundUnit;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;

/// Per-stage wall time of one successful round.
#[derive(Debug, Clone, Default)]
pub struct RoundTimings {
    pub source: Duration,
    /// Indexed like the configured transform chain.
    pub transforms: Vec<Duration>,
    pub sink: Duration,
    pub complete: Duration,
}

impl RoundTimings {
    #[must_use]
    pub fn total(&self) -> Duration {
        self.source + self.transforms.iter().sum::<Duration>() + self.sink + self.complete
    }
}

/// Engine-owned metric registry.
///
/// Plugin collectors are registered into the same registry so one scrape
/// returns everything.
pub struct PipelineMetrics {
    registry: Registry,
    retry_count: IntGauge,
    stage_latency: HistogramVec,
    round_items: IntCounterVec,
    rounds: IntCounter,
    current_round: IntGauge,
}

impl std::fmt::Debug for PipelineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMetrics").finish_non_exhaustive()
    }
}

impl PipelineMetrics {
    /// # Errors
    ///
    /// Fails if `prefix` is not a valid metric namespace.
    pub fn new(prefix: &str) -> Result<Self, prometheus::Error> {
        let prefix = (!prefix.is_empty()).then(|| prefix.to_string());
        let registry = Registry::new_custom(prefix, None)?;

        let retry_count = IntGauge::new(
            "retry_count",
            "Failed attempts of the current round since the last success",
        )?;
        let stage_latency = HistogramVec::new(
            HistogramOpts::new("stage_latency_seconds", "Wall time per pipeline stage")
                .buckets(exponential_buckets(0.0005, 2.0, 16)?),
            &["stage"],
        )?;
        let round_items = IntCounterVec::new(
            Opts::new("round_items_total", "Items exported, by kind"),
            &["kind"],
        )?;
        let rounds = IntCounter::new("rounds_total", "Rounds exported, excluding round 0")?;
        let current_round = IntGauge::new("current_round", "Last completed round")?;

        registry.register(Box::new(retry_count.clone()))?;
        registry.register(Box::new(stage_latency.clone()))?;
        registry.register(Box::new(round_items.clone()))?;
        registry.register(Box::new(rounds.clone()))?;
        registry.register(Box::new(current_round.clone()))?;

        Ok(Self {
            registry,
            retry_count,
            stage_latency,
            round_items,
            rounds,
            current_round,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// # Errors
    ///
    /// Fails on name clashes with already registered series.
    pub fn register_collector(&self, collector: Box<dyn Collector>) -> Result<(), prometheus::Error> {
        self.registry.register(collector)
    }

    pub fn set_retry_count(&self, retries: u64) {
        self.retry_count.set(saturating_i64(retries));
    }

    /// Records a successful round. `transform_labels` must line up with
    /// `timings.transforms`.
    ///
    /// Round 0 only moves the round gauge: it is the bootstrap unit and stays
    /// out of latency and throughput series.
    pub fn observe_round(&self, unit: &RoundUnit, timings: &RoundTimings, transform_labels: &[String]) {
        self.retry_count.set(0);
        self.current_round.set(saturating_i64(unit.round()));
        if unit.round() == 0 {
            return;
        }

        self.observe_stage("source", timings.source);
        for (label, elapsed) in transform_labels.iter().zip(&timings.transforms) {
            self.observe_stage(label, *elapsed);
        }
        self.observe_stage("sink", timings.sink);
        self.observe_stage("complete", timings.complete);
        self.observe_stage("total", timings.total());

        for (kind, count) in unit.item_counts() {
            self.round_items.with_label_values(&[kind]).inc_by(count);
        }
        self.rounds.inc();
    }

    fn observe_stage(&self, stage: &str, elapsed: Duration) {
        self.stage_latency
            .with_label_values(&[stage])
            .observe(elapsed.as_secs_f64());
    }

    /// Render every registered series in the text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if a collector produces an unencodable family.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

async fn render(State(metrics): State<Arc<PipelineMetrics>>) -> Response {
    match metrics.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub(crate) fn router(metrics: Arc<PipelineMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(render))
        .with_state(metrics)
}

/// Running `/metrics` listener.
#[derive(Debug)]
pub(crate) struct MetricsServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl MetricsServer {
    /// Bind `addr` and serve on a background task until [`shutdown`](Self::shutdown).
    pub(crate) async fn bind(addr: &str, metrics: Arc<PipelineMetrics>) -> Result<Self, PipelineError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| PipelineError::Metrics(format!("failed to bind {addr}: {e}")))?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();

        tracing::info!(addr = %addr, "Serving metrics");
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router(metrics))
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
            {
                tracing::error!(error = %e, "Metrics server failed");
            }
        });

        Ok(Self { addr, shutdown, task })
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Metrics server task ended abnormally");
        }
    }
}
