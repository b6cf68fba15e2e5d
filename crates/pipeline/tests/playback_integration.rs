//! End-to-end pipeline tests: synthesis chain into timing into playback

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;

use read_along_config::PlaybackConfig;
use read_along_core::{Command, SpeechEngine};
use read_along_pipeline::playback::{
    CommandOutcome, PlaybackController, PlaybackEvent, PlaybackState, StubBackend,
};
use read_along_pipeline::synthesis::{
    ProviderError, RateSpec, SpeechProvider, SpeechSynthesizer, SynthesisRequest,
    SynthesizedSpeech,
};
use read_along_pipeline::timing;

/// Test provider that writes a real WAV of the given length
struct WavProvider {
    engine: SpeechEngine,
    duration_secs: f64,
    fail: bool,
}

impl WavProvider {
    fn ok(engine: SpeechEngine, duration_secs: f64) -> Self {
        Self {
            engine,
            duration_secs,
            fail: false,
        }
    }

    fn failing(engine: SpeechEngine) -> Self {
        Self {
            engine,
            duration_secs: 0.0,
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl SpeechProvider for WavProvider {
    fn engine(&self) -> SpeechEngine {
        self.engine
    }

    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedSpeech, ProviderError> {
        if self.fail {
            return Err(ProviderError::Http("refused".to_string()));
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&request.out_path, spec).unwrap();
        for _ in 0..(8000.0 * self.duration_secs) as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        Ok(SynthesizedSpeech {
            path: request.out_path.clone(),
            word_marks: None,
        })
    }
}

fn test_config() -> PlaybackConfig {
    PlaybackConfig {
        poll_interval_ms: 10,
        seek_step_secs: 5.0,
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
    events
}

#[tokio::test]
async fn synthesized_track_plays_through_to_finished() {
    let dir = tempfile::tempdir().unwrap();
    let text = "the quick brown fox jumps";

    let chain = SpeechSynthesizer::new(
        Arc::new(WavProvider::failing(SpeechEngine::Neural)),
        Arc::new(WavProvider::ok(SpeechEngine::Espeak, 0.2)),
        Duration::from_secs(2),
        dir.path().join("speech.wav"),
    );

    let outcome = chain
        .synthesize(text, "en-US-AriaNeural", RateSpec::default())
        .await
        .unwrap();
    assert_eq!(outcome.track.engine, SpeechEngine::Espeak);
    assert!((outcome.track.duration_secs - 0.2).abs() < 1e-3);

    let table = match &outcome.word_marks {
        Some(marks) => timing::from_word_marks(marks, outcome.track.duration_secs),
        None => timing::estimate(text, outcome.track.duration_secs),
    };
    assert_eq!(table.len(), 5);

    let backend = Arc::new(StubBackend::new());
    let ctrl = PlaybackController::new(outcome.track, table, backend.clone(), &test_config());
    let mut rx = ctrl.subscribe();

    ctrl.handle(Command::Play).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    backend.finish();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(ctrl.state(), PlaybackState::Finished);

    let events = drain(&mut rx);
    let indices: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::WordChanged { index } => Some(*index),
            _ => None,
        })
        .collect();

    // highlight starts at the first word and never moves backwards
    assert!(!indices.is_empty());
    assert_eq!(indices[0], 0);
    for pair in indices.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    // the index never leaves the word range
    assert!(indices.iter().all(|&i| i < 5));
    assert!(events
        .iter()
        .any(|e| matches!(e, PlaybackEvent::Finished)));
}

#[tokio::test]
async fn play_pause_resume_stop_leaves_stopped_with_one_backend_stop() {
    let backend = Arc::new(StubBackend::new());
    let table = timing::estimate("one two three four", 2.0);
    let track = read_along_core::AudioTrack::new("/tmp/x.wav", 2.0, SpeechEngine::Neural);
    let ctrl = PlaybackController::new(track, table, backend.clone(), &test_config());
    let mut rx = ctrl.subscribe();

    ctrl.handle(Command::Play).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    ctrl.handle(Command::Pause).await.unwrap();
    ctrl.handle(Command::Resume).await.unwrap();
    ctrl.handle(Command::Stop).await.unwrap();

    // give a straggling loop tick the chance to misbehave
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(ctrl.state(), PlaybackState::Stopped);
    assert_eq!(backend.stop_calls(), 1);

    let events = drain(&mut rx);
    let stopped_at = events
        .iter()
        .position(|e| matches!(e, PlaybackEvent::Stopped))
        .expect("stop event");
    assert!(
        events[stopped_at..]
            .iter()
            .all(|e| !matches!(e, PlaybackEvent::WordChanged { .. })),
        "no highlight events may follow a stop"
    );
}

#[tokio::test]
async fn seek_on_unseekable_backend_reports_and_preserves_position() {
    let backend = Arc::new(StubBackend::unseekable());
    let table = timing::estimate("alpha beta gamma delta", 10.0);
    let track = read_along_core::AudioTrack::new("/tmp/x.wav", 10.0, SpeechEngine::Neural);
    let ctrl = PlaybackController::new(track, table, backend.clone(), &test_config());

    ctrl.handle(Command::Play).await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;

    let state_before = ctrl.state();
    let err = ctrl.handle(Command::SeekRelative(-5.0)).await.unwrap_err();

    assert!(matches!(
        err,
        read_along_core::PlaybackError::SeekUnsupported
    ));
    assert_eq!(ctrl.state(), state_before);
    assert_eq!(backend.play_offsets().len(), 1, "no restart may happen");
}

#[tokio::test]
async fn seek_restart_rebases_elapsed_at_target() {
    let backend = Arc::new(StubBackend::new());
    let table = timing::estimate("alpha beta gamma delta epsilon zeta", 30.0);
    let track = read_along_core::AudioTrack::new("/tmp/x.wav", 30.0, SpeechEngine::Neural);
    let ctrl = PlaybackController::new(track, table, backend.clone(), &test_config());

    ctrl.handle(Command::Play).await.unwrap();
    ctrl.handle(Command::SeekRelative(5.0)).await.unwrap();

    let offsets = backend.play_offsets();
    assert_eq!(offsets.len(), 2);
    assert!(offsets[1] >= 5.0 && offsets[1] < 5.5);

    // the elapsed baseline was rebuilt at the new offset, not left stale
    let elapsed = ctrl.elapsed_secs();
    assert!(elapsed >= 5.0 && elapsed < 5.5, "elapsed was {elapsed}");
    assert_eq!(ctrl.state(), PlaybackState::Playing);
}

#[tokio::test]
async fn switch_mode_roundtrip_restarts_playback() {
    let backend = Arc::new(StubBackend::new());
    let table = timing::estimate("alpha beta gamma", 2.0);
    let track = read_along_core::AudioTrack::new("/tmp/x.wav", 2.0, SpeechEngine::Neural);
    let ctrl = PlaybackController::new(track, table, backend.clone(), &test_config());

    ctrl.handle(Command::Play).await.unwrap();
    let outcome = ctrl
        .handle(Command::SwitchMode(read_along_core::PlaybackMode::Karaoke))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::SwitchMode(read_along_core::PlaybackMode::Karaoke)
    );
    assert_eq!(ctrl.state(), PlaybackState::Stopped);

    // the caller restarts in the new mode via Replay
    ctrl.handle(Command::Replay).await.unwrap();
    assert_eq!(ctrl.state(), PlaybackState::Playing);
    assert_eq!(backend.play_offsets(), vec![0.0, 0.0]);
}
