use roundhouse_e2e::harness::{self, PipelineSpec};

#[test]
fn harness_bootstrap_exposes_data_dir() {
    let context = harness::bootstrap().expect("bootstrap must create a data dir");
    assert!(context.data_dir().exists());
}

#[test]
fn builtin_registry_holds_every_connector() {
    let registry = harness::builtin_registry().expect("registry must build");
    assert!(registry.resolve_source("synthetic").is_ok());
    assert!(registry.resolve_transform("noop").is_ok());
    assert!(registry.resolve_sink("noop").is_ok());
    assert!(registry.resolve_sink("file").is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn synthetic_to_noop_reaches_tip() {
    let context = harness::bootstrap().unwrap();
    let spec = PipelineSpec {
        tip: 5,
        ..PipelineSpec::default()
    };

    let summary = context.run_to_tip(&spec).await.expect("run must succeed");

    assert_eq!(summary.next_round, 6);
    assert_eq!(summary.rounds_completed, 6);
    assert_eq!(summary.persistence_failures, 0);
    let checkpoint = context.checkpoint().unwrap();
    assert_eq!(checkpoint.next_round, 6);
    assert_eq!(checkpoint.network, "e2enet");
    assert!(!checkpoint.genesis_hash.is_empty());
}
