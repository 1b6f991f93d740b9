use roundhouse_e2e::harness::{self, PipelineSpec, SinkKind};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_round_is_written_once_in_order() {
    let context = harness::bootstrap().unwrap();
    let spec = PipelineSpec {
        tip: 4,
        items_per_round: 5,
        transforms: 2,
        sink: SinkKind::File { pretty: true },
        ..PipelineSpec::default()
    };

    context.run_to_tip(&spec).await.unwrap();

    let rounds = context.exported_rounds().unwrap();
    let numbers: Vec<u64> = rounds.iter().map(|u| u.round()).collect();
    assert_eq!(numbers, [0, 1, 2, 3, 4]);
    for unit in &rounds {
        assert_eq!(unit.items.len(), 5);
    }
    assert_eq!(
        rounds[3].header.parent_hash,
        rounds[2].certificate.as_ref().map(|c| c["hash"].as_str().unwrap().to_string())
    );

    let marker = std::fs::read_to_string(context.sink_dir().join("last-round")).unwrap();
    assert_eq!(marker.trim(), "4");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn output_is_identical_across_runs() {
    let spec = PipelineSpec {
        tip: 2,
        sink: SinkKind::File { pretty: false },
        ..PipelineSpec::default()
    };

    let a = harness::bootstrap().unwrap();
    a.run_to_tip(&spec).await.unwrap();
    let b = harness::bootstrap().unwrap();
    b.run_to_tip(&spec).await.unwrap();

    assert_eq!(a.exported_rounds().unwrap(), b.exported_rounds().unwrap());
}
