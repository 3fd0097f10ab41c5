//! Conversion controller behaviour against scripted encoder and prober

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use common::*;
use webm_converter::app::{ConversionController, JobEvent};
use webm_converter::{
    ConversionRequest, ConvertError, EncodeConfig, JobOutcome, JobState, Pass, ProbeError,
    ProbeErrorKind,
};

struct Fixture {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    std::fs::write(&input, b"source").unwrap();
    let output = dir.path().join("clip.webm");
    Fixture {
        _dir: dir,
        input,
        output,
    }
}

fn controller(
    probe: Arc<FixedProbe>,
    encoder: Arc<ScriptedEncoder>,
) -> (ConversionController, tokio::sync::mpsc::UnboundedReceiver<JobEvent>) {
    ConversionController::new(probe, encoder)
}

#[tokio::test]
async fn test_both_passes_share_bitrate_and_job_completes() {
    let fx = fixture();
    let probe = Arc::new(FixedProbe::ok(120.0, 1920, 1080));
    let (encoder, _started) = ScriptedEncoder::new(vec![
        Step::exit(0).with_lines(&["Input #0, mov", "frame=10 time=00:01:00.00 bitrate=1k"]),
        Step::exit(0).with_lines(&[
            "frame=1 time=00:00:30.00",
            "frame=2 time=00:01:00.00",
            "frame=3 time=00:02:00.00",
        ]),
    ]);
    let encoder = Arc::new(encoder);
    let (controller, mut events) = controller(probe.clone(), encoder.clone());

    let handle = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    let seen = collect_until_completed(&mut events).await;
    let outcome = handle.wait().await;

    assert_eq!(
        outcome,
        JobOutcome::Completed {
            output: fx.output.clone(),
            size_bytes: 2048
        }
    );
    assert_eq!(
        states(&seen),
        vec![
            JobState::Created,
            JobState::Probing,
            JobState::Encoding(Pass::First),
            JobState::Encoding(Pass::Second),
            JobState::Completed,
        ]
    );

    let second_pass: Vec<u8> = seen
        .iter()
        .filter_map(|event| match event {
            JobEvent::Progress(report) if report.pass == Pass::Second => Some(report.percent),
            _ => None,
        })
        .collect();
    assert_eq!(second_pass, vec![25, 50, 100]);

    let calls = encoder.calls();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        assert_eq!(value_after(&call.args, "-b:v"), Some("196.6k"));
        assert_eq!(value_after(&call.args, "-vf"), Some("scale=1920:1080,fps=fps=30"));
    }
    assert_eq!(calls[0].pass, Pass::First);
    assert_eq!(calls[1].pass, Pass::Second);
    assert_eq!(probe.calls(), 1);

    assert!(!controller.is_busy());
    assert_eq!(controller.current().map(|s| s.state), Some(JobState::Completed));
}

#[tokio::test]
async fn test_first_pass_failure_skips_second_pass() {
    let fx = fixture();
    let (encoder, _started) = ScriptedEncoder::new(vec![Step::exit(1)]);
    let encoder = Arc::new(encoder);
    let (controller, mut events) =
        controller(Arc::new(FixedProbe::ok(60.0, 640, 480)), encoder.clone());

    let handle = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    let seen = collect_until_completed(&mut events).await;

    let expected = ConvertError::EncoderNonZeroExit {
        pass: Pass::First,
        code: Some(1),
    };
    assert_eq!(handle.wait().await, JobOutcome::Failed(expected.clone()));
    assert_eq!(encoder.calls().len(), 1);

    match seen.last() {
        Some(JobEvent::Completed { outcome, .. }) => {
            assert!(!outcome.is_success());
            assert_eq!(
                outcome.message(),
                "Conversion failed: Encoder pass 1 exited with code 1"
            );
        }
        other => panic!("unexpected last event: {other:?}"),
    }
    assert!(!fx.output.exists());
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_second_start_is_rejected_while_busy() {
    let fx = fixture();
    let (encoder, mut started) = ScriptedEncoder::new(vec![Step::blocking()]);
    let encoder = Arc::new(encoder);
    let probe = Arc::new(FixedProbe::ok(60.0, 640, 480));
    let (controller, mut events) = controller(probe.clone(), encoder.clone());

    let first = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    let first_id = first.id();
    assert_eq!(started.recv().await, Some(Pass::First));
    assert!(controller.is_busy());

    let rejected = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await;
    assert!(matches!(rejected, Err(ConvertError::Busy)));
    assert_eq!(probe.calls(), 1);
    assert_eq!(encoder.calls().len(), 1);

    assert!(controller.cancel());
    collect_until_completed(&mut events).await;
    assert_eq!(first.wait().await, JobOutcome::Cancelled);

    // The slot is free again once the job is terminal
    assert!(!controller.is_busy());
    let second = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    assert_ne!(second.id(), first_id);
    collect_until_completed(&mut events).await;
    assert!(second.wait().await.is_success());
}

#[tokio::test]
async fn test_cancel_during_second_pass_kills_job() {
    let fx = fixture();
    let (encoder, mut started) = ScriptedEncoder::new(vec![
        Step::exit(0),
        Step::blocking().with_lines(&["frame=1 time=00:00:10.00"]),
    ]);
    let encoder = Arc::new(encoder);
    let (controller, mut events) =
        controller(Arc::new(FixedProbe::ok(100.0, 640, 480)), encoder.clone());

    let handle = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    assert_eq!(started.recv().await, Some(Pass::First));
    assert_eq!(started.recv().await, Some(Pass::Second));

    handle.cancel();
    let seen = collect_until_completed(&mut events).await;
    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap();

    assert_eq!(outcome, JobOutcome::Cancelled);
    assert_eq!(outcome.message(), "Conversion cancelled");
    assert_eq!(states(&seen).last(), Some(&JobState::Cancelled));
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_existing_output_is_removed_before_encoding() {
    let fx = fixture();
    std::fs::write(&fx.output, b"stale result").unwrap();
    let (encoder, _started) = ScriptedEncoder::new(vec![Step::exit(0), Step::exit(0)]);
    let encoder = Arc::new(encoder);
    let (controller, mut events) =
        controller(Arc::new(FixedProbe::ok(30.0, 640, 480)), encoder.clone());

    let handle = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    collect_until_completed(&mut events).await;
    assert!(handle.wait().await.is_success());

    let calls = encoder.calls();
    assert_eq!(calls[1].pass, Pass::Second);
    assert!(!calls[1].target_existed);
    assert_eq!(std::fs::read(&fx.output).unwrap().len(), 2048);
}

#[tokio::test]
async fn test_probe_failure_fails_without_encoding() {
    let fx = fixture();
    let probe = Arc::new(FixedProbe::err(ProbeError::no_video_stream("audio only")));
    let (encoder, _started) = ScriptedEncoder::new(Vec::new());
    let encoder = Arc::new(encoder);
    let (controller, mut events) = controller(probe.clone(), encoder.clone());

    let err = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap_err();
    match &err {
        ConvertError::Probe(e) => assert_eq!(e.kind, ProbeErrorKind::NoVideoStream),
        other => panic!("unexpected error: {other}"),
    }

    let seen = collect_until_completed(&mut events).await;
    assert_eq!(
        states(&seen),
        vec![JobState::Created, JobState::Probing, JobState::Failed]
    );
    assert!(encoder.calls().is_empty());
    assert!(!controller.is_busy());

    // A failed probe does not wedge the controller
    assert!(controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .is_err());
    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn test_missing_input_is_rejected_before_probing() {
    let fx = fixture();
    let probe = Arc::new(FixedProbe::ok(30.0, 640, 480));
    let (encoder, _started) = ScriptedEncoder::new(Vec::new());
    let (controller, _events) = controller(probe.clone(), Arc::new(encoder));

    let missing = fx.input.with_file_name("gone.mp4");
    let err = controller
        .start_conversion(ConversionRequest::new(&missing, EncodeConfig::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::InputMissing { .. }));
    assert_eq!(probe.calls(), 0);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_probing() {
    let fx = fixture();
    let probe = Arc::new(FixedProbe::ok(30.0, 640, 480));
    let (encoder, _started) = ScriptedEncoder::new(Vec::new());
    let (controller, _events) = controller(probe.clone(), Arc::new(encoder));

    let config = EncodeConfig {
        target_size_mb: 0.0,
        ..EncodeConfig::default()
    };
    let err = controller
        .start_conversion(ConversionRequest::new(&fx.input, config))
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::InvalidInput(_)));
    assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_non_positive_duration_is_rejected_by_start() {
    let fx = fixture();
    let (encoder, _started) = ScriptedEncoder::new(Vec::new());
    let encoder = Arc::new(encoder);
    let (controller, mut events) =
        controller(Arc::new(FixedProbe::ok(0.0, 640, 480)), encoder.clone());

    let err = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::InvalidInput(_)));

    let seen = collect_until_completed(&mut events).await;
    assert_eq!(states(&seen).last(), Some(&JobState::Failed));
    assert!(encoder.calls().is_empty());
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_state_watch_follows_job() {
    let fx = fixture();
    let (encoder, mut started) = ScriptedEncoder::new(vec![Step::blocking()]);
    let (controller, mut events) =
        controller(Arc::new(FixedProbe::ok(30.0, 640, 480)), Arc::new(encoder));
    let mut state = controller.subscribe_state();
    assert_eq!(*state.borrow(), None);

    let handle = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    started.recv().await;
    assert_eq!(
        controller.current().map(|s| s.state),
        Some(JobState::Encoding(Pass::First))
    );

    handle.cancel();
    collect_until_completed(&mut events).await;
    state.changed().await.unwrap();
    assert_eq!(state.borrow().map(|s| s.state), Some(JobState::Cancelled));
}

#[tokio::test]
async fn test_cancel_only_reaches_the_running_job() {
    let fx = fixture();
    let (encoder, mut started) = ScriptedEncoder::new(vec![Step::exit(0), Step::exit(0)]);
    let encoder = Arc::new(encoder);
    let (controller, mut events) =
        controller(Arc::new(FixedProbe::ok(30.0, 640, 480)), encoder.clone());
    assert!(!controller.cancel());

    let finished = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    collect_until_completed(&mut events).await;
    assert!(finished.wait().await.is_success());

    // Nothing is running, so there is nothing to cancel
    assert!(!controller.cancel());

    encoder.push(Step::blocking());
    let running = controller
        .start_conversion(ConversionRequest::new(&fx.input, EncodeConfig::default()))
        .await
        .unwrap();
    started.recv().await;
    started.recv().await;
    assert_eq!(started.recv().await, Some(Pass::First));

    assert!(controller.cancel());
    collect_until_completed(&mut events).await;
    assert_eq!(running.wait().await, JobOutcome::Cancelled);
    assert!(!controller.cancel());
}
