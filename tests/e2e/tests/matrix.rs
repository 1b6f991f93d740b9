use rstest::rstest;

use roundhouse_e2e::harness::{self, PipelineSpec, SinkKind};

#[rstest]
#[case(0, 1, SinkKind::Noop)]
#[case(1, 0, SinkKind::Noop)]
#[case(3, 10, SinkKind::Noop)]
#[case(0, 4, SinkKind::File { pretty: false })]
#[case(2, 7, SinkKind::File { pretty: true })]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chain_shapes_export_every_round(
    #[case] transforms: usize,
    #[case] items_per_round: u32,
    #[case] sink: SinkKind,
) {
    let context = harness::bootstrap().unwrap();
    let spec = PipelineSpec {
        tip: 3,
        transforms,
        items_per_round,
        sink,
        ..PipelineSpec::default()
    };

    let summary = context.run_to_tip(&spec).await.unwrap();
    assert_eq!(summary.next_round, 4);
    assert_eq!(summary.rounds_completed, 4);

    for i in 0..transforms {
        assert!(context.data_dir().join(format!("transform_{i}_noop")).is_dir());
    }
    if let SinkKind::File { .. } = sink {
        let rounds = context.exported_rounds().unwrap();
        assert_eq!(rounds.len(), 4);
        assert!(rounds.iter().all(|u| u.items.len() == items_per_round as usize));
    }
}
