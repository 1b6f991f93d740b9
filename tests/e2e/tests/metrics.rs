use roundhouse_e2e::harness::{self, PipelineSpec};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metrics_endpoint_reports_rounds_and_plugin_series() {
    let context = harness::bootstrap().unwrap();
    let spec = PipelineSpec {
        tip: 3,
        transforms: 1,
        items_per_round: 3,
        metrics: true,
        ..PipelineSpec::default()
    };

    let summary = context.run_to_tip(&spec).await.unwrap();
    let body = summary.metrics.expect("metrics scraped");

    // Round 0 is excluded from throughput.
    assert!(body.contains("e2e_rounds_total 3"), "{body}");
    assert!(body.contains("e2e_current_round 3"), "{body}");
    assert!(body.contains("e2e_round_items_total{kind=\"pay\"} 3"), "{body}");
    assert!(body.contains("stage=\"transform_0_noop\""), "{body}");
    assert!(body.contains("stage=\"total\""), "{body}");
    assert!(body.contains("e2e_synthetic_units_total"), "{body}");
    assert!(body.contains("e2e_retry_count"), "{body}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metrics_are_off_by_default() {
    let context = harness::bootstrap().unwrap();
    let summary = context.run_to_tip(&PipelineSpec { tip: 0, ..PipelineSpec::default() }).await.unwrap();
    assert!(summary.metrics.is_none());
}
