use roundhouse_e2e::harness::{self, PipelineSpec};
use roundhouse_engine::PipelineError;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restart_resumes_from_checkpoint() {
    let context = harness::bootstrap().unwrap();

    let first = context
        .run_to_tip(&PipelineSpec { tip: 3, ..PipelineSpec::default() })
        .await
        .unwrap();
    assert_eq!(first.next_round, 4);

    let second = context
        .run_to_tip(&PipelineSpec { tip: 7, ..PipelineSpec::default() })
        .await
        .unwrap();
    assert_eq!(second.rounds_completed, 4, "rounds 4..=7 only");
    assert_eq!(context.checkpoint().unwrap().next_round, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn different_seed_is_refused_on_restart() {
    let context = harness::bootstrap().unwrap();
    context
        .run_to_tip(&PipelineSpec { tip: 1, ..PipelineSpec::default() })
        .await
        .unwrap();
    let before = context.checkpoint().unwrap();

    let err = context
        .run_to_tip(&PipelineSpec {
            seed: 99,
            tip: 4,
            ..PipelineSpec::default()
        })
        .await
        .unwrap_err();

    let err = err.downcast::<PipelineError>().expect("engine error");
    assert!(matches!(err, PipelineError::GenesisMismatch { .. }), "got {err}");
    assert_eq!(context.checkpoint().unwrap(), before, "checkpoint must be untouched");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn round_override_skips_ahead() {
    let context = harness::bootstrap().unwrap();
    context
        .run_to_tip(&PipelineSpec { tip: 2, ..PipelineSpec::default() })
        .await
        .unwrap();

    let summary = context
        .run_to_tip(&PipelineSpec {
            tip: 12,
            round_override: Some(10),
            ..PipelineSpec::default()
        })
        .await
        .unwrap();

    assert_eq!(summary.rounds_completed, 3, "rounds 10..=12");
    assert_eq!(context.checkpoint().unwrap().next_round, 13);
}
