//! Voice command integration tests
//!
//! Drives the recognizer with a scripted engine; no audio hardware needed.

use std::sync::Arc;
use std::time::Duration;

use infinite_twister::game::{GameController, Phase};
use infinite_twister::voice::{
    EngineError, EngineEvent, Intent, PERMISSION_DENIED_MESSAGE, SAMPLE_RATE, SegmenterState,
    TypedEngine, UtteranceSegmenter, VoiceCapability, VoiceNotice, VoiceRecognizer,
    samples_to_wav,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

mod common;
use common::{FakeEngine, RecordingAnnouncer, wait_for_session};

struct Harness {
    recognizer: VoiceRecognizer,
    intents: mpsc::UnboundedReceiver<Intent>,
    notices: mpsc::UnboundedReceiver<VoiceNotice>,
}

fn recognizer_with(engine: &FakeEngine) -> Harness {
    let (intents_tx, intents) = mpsc::unbounded_channel();
    let (notices_tx, notices) = mpsc::unbounded_channel();
    let recognizer = VoiceRecognizer::new(
        VoiceCapability::Supported(Box::new(engine.clone())),
        intents_tx,
        notices_tx,
    );
    Harness {
        recognizer,
        intents,
        notices,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}

#[tokio::test(start_paused = true)]
async fn test_please_stop_now_stops_once() {
    let engine = FakeEngine::default();
    let mut harness = recognizer_with(&engine);

    assert!(harness.recognizer.start_listening());
    assert!(engine.say("please stop now"));
    settle().await;

    assert_eq!(drain(&mut harness.intents), vec![Intent::Stop]);
}

#[tokio::test(start_paused = true)]
async fn test_interim_results_ignored() {
    let engine = FakeEngine::default();
    let mut harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    engine.emit(EngineEvent::Result {
        transcript: "stop".to_string(),
        is_final: false,
    });
    engine.say("hello there");
    settle().await;

    assert!(drain(&mut harness.intents).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_both_intents_stop_first() {
    let engine = FakeEngine::default();
    let mut harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    engine.say("Stop! No wait, go");
    settle().await;

    assert_eq!(drain(&mut harness.intents), vec![Intent::Stop, Intent::Start]);
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_no_restart() {
    let engine = FakeEngine::default();
    let mut harness = recognizer_with(&engine);

    assert!(harness.recognizer.start_listening());
    let events = engine.sender().unwrap();
    events
        .send(EngineEvent::Error(EngineError::NotAllowed))
        .unwrap();
    settle().await;

    let state = harness.recognizer.state();
    assert!(!state.is_listening);
    assert_eq!(state.last_error.as_deref(), Some("Recognition error: not-allowed"));
    assert_eq!(
        drain(&mut harness.notices),
        vec![VoiceNotice::PermissionDenied(
            PERMISSION_DENIED_MESSAGE.to_string()
        )]
    );

    events.send(EngineEvent::Ended).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(engine.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_error_recorded() {
    let engine = FakeEngine::default();
    let harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    engine.emit(EngineEvent::Error(EngineError::Other("network".to_string())));
    settle().await;

    let state = harness.recognizer.state();
    assert!(state.is_listening);
    assert_eq!(state.last_error.as_deref(), Some("Recognition error: network"));
}

#[tokio::test(start_paused = true)]
async fn test_end_of_stream_restarts() {
    let engine = FakeEngine::default();
    let harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    engine.emit(EngineEvent::Ended);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.starts(), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.starts(), 2);
    assert!(harness.recognizer.is_listening());
}

#[tokio::test(start_paused = true)]
async fn test_no_restart_after_explicit_stop() {
    let engine = FakeEngine::default();
    let harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    let events = engine.sender().unwrap();
    harness.recognizer.stop_listening();
    events.send(EngineEvent::Ended).unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(engine.starts(), 1);
    assert_eq!(engine.stops(), 1);

    let state = harness.recognizer.state();
    assert!(!state.is_listening);
    assert!(state.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stop_inside_restart_window() {
    let engine = FakeEngine::default();
    let harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    engine.emit(EngineEvent::Ended);
    settle().await;
    harness.recognizer.stop_listening();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(engine.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_end_of_previous_run_ignored() {
    let engine = FakeEngine::default();
    let harness = recognizer_with(&engine);

    assert!(harness.recognizer.start_listening());
    let previous = engine.sender().unwrap();
    harness.recognizer.stop_listening();
    assert!(harness.recognizer.start_listening());

    previous.send(EngineEvent::Ended).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(engine.starts(), 2);
    let state = harness.recognizer.state();
    assert!(state.is_listening);
    assert!(state.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_manual_start_inside_restart_window_wins() {
    let engine = FakeEngine::default();
    let harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    engine.emit(EngineEvent::Ended);
    settle().await;
    harness.recognizer.stop_listening();
    harness.recognizer.start_listening();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(engine.starts(), 2);
    assert!(harness.recognizer.state().last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_each_start_gets_a_new_run() {
    let engine = FakeEngine::default();
    let harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    let first = engine.sender().unwrap().run();
    engine.emit(EngineEvent::Ended);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let second = engine.sender().unwrap().run();
    assert!(second > first);
}

#[tokio::test(start_paused = true)]
async fn test_restart_failure_recorded() {
    let engine = FakeEngine::default();
    let harness = recognizer_with(&engine);

    harness.recognizer.start_listening();
    engine.fail_next_starts();
    engine.emit(EngineEvent::Ended);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let state = harness.recognizer.state();
    assert_eq!(
        state.last_error.as_deref(),
        Some("Restart failed: recognition error: engine busy")
    );
}

#[tokio::test(start_paused = true)]
async fn test_start_failure_recorded() {
    let engine = FakeEngine::default();
    engine.fail_next_starts();
    let harness = recognizer_with(&engine);

    assert!(!harness.recognizer.start_listening());
    let state = harness.recognizer.state();
    assert!(!state.is_listening);
    assert!(state.last_error.unwrap().starts_with("Start failed:"));
}

#[tokio::test(start_paused = true)]
async fn test_voice_stops_and_restarts_game() {
    let engine = FakeEngine::default();
    let (intents_tx, intents_rx) = mpsc::unbounded_channel();
    let (notices_tx, _notices) = mpsc::unbounded_channel();

    let controller = GameController::spawn(
        3,
        StdRng::seed_from_u64(21),
        Arc::new(RecordingAnnouncer::default()),
        Some(intents_rx),
    );
    let recognizer = VoiceRecognizer::new(
        VoiceCapability::Supported(Box::new(engine.clone())),
        intents_tx,
        notices_tx,
    );
    let mut session = controller.subscribe();

    recognizer.start_listening();
    engine.say("ok start");
    wait_for_session(&mut session, |s| s.is_spinning).await;

    engine.say("please stop now");
    let stopped = wait_for_session(&mut session, |s| s.phase == Phase::Paused).await;
    assert!(!stopped.is_spinning);
    assert!(!controller.is_playing());

    engine.say("let's go");
    let resumed = wait_for_session(&mut session, |s| s.is_spinning).await;
    assert_eq!(resumed.phase, Phase::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_typed_engine_through_recognizer() {
    let (engine, feed) = TypedEngine::new();
    let (intents_tx, mut intents) = mpsc::unbounded_channel();
    let (notices_tx, _notices) = mpsc::unbounded_channel();
    let recognizer = VoiceRecognizer::new(
        VoiceCapability::Supported(Box::new(engine)),
        intents_tx,
        notices_tx,
    );

    assert!(!feed.send("go"));
    assert!(recognizer.start_listening());
    assert!(feed.send("Let's begin"));
    settle().await;
    assert_eq!(drain(&mut intents), vec![Intent::Start]);

    recognizer.stop_listening();
    assert!(!feed.is_listening());
}

/// Generate sine wave audio samples
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

#[test]
fn test_segmenter_yields_utterance_as_wav() {
    let mut segmenter = UtteranceSegmenter::new();
    let speech = generate_sine_samples(440.0, 1.0, 0.5);
    let silence = vec![0.0; SAMPLE_RATE as usize];

    assert!(segmenter.push(&speech).is_none());
    assert_eq!(segmenter.state(), SegmenterState::Speaking);

    let utterance = segmenter.push(&silence).expect("utterance after silence");
    assert!(utterance.len() >= speech.len());
    assert_eq!(segmenter.state(), SegmenterState::Idle);

    let wav = samples_to_wav(&utterance, SAMPLE_RATE).unwrap();
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
}
