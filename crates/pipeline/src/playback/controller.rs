//! Playback controller
//!
//! Owns the playback session and drives the audio backend together with the
//! polling highlight loop. Commands are serialized through a single async
//! gate; seek and replay restarts happen inside it as a non-interruptible
//! critical section.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use read_along_config::PlaybackConfig;
use read_along_core::{AudioTrack, Command, PlaybackError, PlaybackMode, TimingTable};

use super::{AudioBackend, PlaybackSession, PlaybackState};

/// Events emitted during a playback session
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// Session state changed
    StateChanged {
        old: PlaybackState,
        new: PlaybackState,
    },
    /// The highlighted word index changed
    WordChanged { index: usize },
    /// The stream drained to the end of the track
    Finished,
    /// Playback was stopped by command
    Stopped,
}

/// What the caller should do after a command was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Keep accepting commands
    Continue,
    /// Playback stopped; caller switches presentation mode and restarts
    SwitchMode(PlaybackMode),
    /// Session over; caller tears down
    Quit,
}

/// State machine driving one audio track with word-level highlight events
///
/// Transition table: Play (Stopped/Finished), Pause (Playing), Resume
/// (Paused), Stop (Playing/Paused), Replay (any), SeekRelative
/// (Playing/Paused, seekable backends only), SwitchMode (stops playback),
/// Quit (any). Redundant Pause/Resume are idempotent no-ops, never errors.
///
/// A seek restarts the stream at the recomputed offset and rebuilds the
/// elapsed-time baseline there; a seek while paused therefore resumes
/// playback, matching the restart semantics of the underlying backends.
pub struct PlaybackController {
    backend: Arc<dyn AudioBackend>,
    track: AudioTrack,
    timings: Arc<TimingTable>,
    session: Arc<Mutex<PlaybackSession>>,
    event_tx: broadcast::Sender<PlaybackEvent>,
    poll_interval: Duration,
    /// Serializes command handling; held across stream restarts
    command_gate: tokio::sync::Mutex<()>,
    highlight_task: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackController {
    pub fn new(
        track: AudioTrack,
        timings: TimingTable,
        backend: Arc<dyn AudioBackend>,
        config: &PlaybackConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            backend,
            track,
            timings: Arc::new(timings),
            session: Arc::new(Mutex::new(PlaybackSession::new())),
            event_tx,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            command_gate: tokio::sync::Mutex::new(()),
            highlight_task: Mutex::new(None),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_tx.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.session.lock().state
    }

    /// Current track position in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.session.lock().elapsed_secs()
    }

    /// Last highlighted word index
    pub fn current_word(&self) -> Option<usize> {
        self.session.lock().current_word
    }

    pub fn track(&self) -> &AudioTrack {
        &self.track
    }

    pub fn timings(&self) -> &TimingTable {
        &self.timings
    }

    /// Handle one command
    ///
    /// At most one command is in flight at a time; a command arriving during
    /// a seek or replay restart waits for the restart to complete. Errors
    /// leave the session either unchanged (`SeekUnsupported`) or forced to
    /// `Stopped` (`BackendIo`), never in an intermediate state.
    pub async fn handle(&self, command: Command) -> Result<CommandOutcome, PlaybackError> {
        let _gate = self.command_gate.lock().await;

        match command {
            Command::Play => {
                match self.state() {
                    PlaybackState::Stopped | PlaybackState::Finished => self.start_at(0.0)?,
                    state => {
                        tracing::debug!(?state, "play ignored: stream already active");
                    }
                }
                Ok(CommandOutcome::Continue)
            }

            Command::Pause => {
                let old = {
                    let mut session = self.session.lock();
                    if session.state != PlaybackState::Playing {
                        return Ok(CommandOutcome::Continue);
                    }
                    let old = session.state;
                    self.backend.pause();
                    session.freeze();
                    old
                };
                self.emit_state(old, PlaybackState::Paused);
                Ok(CommandOutcome::Continue)
            }

            Command::Resume => {
                let old = {
                    let mut session = self.session.lock();
                    if session.state != PlaybackState::Paused {
                        return Ok(CommandOutcome::Continue);
                    }
                    let old = session.state;
                    self.backend.resume();
                    session.unfreeze();
                    old
                };
                self.emit_state(old, PlaybackState::Playing);
                Ok(CommandOutcome::Continue)
            }

            Command::Stop => {
                self.halt();
                Ok(CommandOutcome::Continue)
            }

            Command::Replay => {
                self.start_at(0.0)?;
                Ok(CommandOutcome::Continue)
            }

            Command::SeekRelative(delta_secs) => {
                let state = self.state();
                if !matches!(state, PlaybackState::Playing | PlaybackState::Paused) {
                    tracing::debug!(?state, "seek ignored: no active stream");
                    return Ok(CommandOutcome::Continue);
                }
                if !self.backend.supports_seek(&self.track) {
                    return Err(PlaybackError::SeekUnsupported);
                }
                let target = (self.elapsed_secs() + delta_secs).max(0.0);
                tracing::debug!(delta_secs, target, "restarting stream at offset");
                self.start_at(target)?;
                Ok(CommandOutcome::Continue)
            }

            Command::SwitchMode(mode) => {
                if matches!(
                    self.state(),
                    PlaybackState::Playing | PlaybackState::Paused
                ) {
                    self.halt();
                }
                Ok(CommandOutcome::SwitchMode(mode))
            }

            Command::Quit => {
                self.halt();
                if let Some(task) = self.highlight_task.lock().take() {
                    task.abort();
                }
                Ok(CommandOutcome::Quit)
            }
        }
    }

    /// Start (or restart) the stream at a track offset
    ///
    /// The session lock is held across the backend swap so the highlight
    /// loop can never observe a half-restarted stream.
    fn start_at(&self, offset_secs: f64) -> Result<(), PlaybackError> {
        let (old, result) = {
            let mut session = self.session.lock();
            let old = session.state;
            if matches!(old, PlaybackState::Playing | PlaybackState::Paused) {
                self.backend.stop();
            }
            match self
                .backend
                .play(&self.track, Duration::from_secs_f64(offset_secs))
            {
                Ok(()) => {
                    session.restart_at(offset_secs);
                    (old, Ok(()))
                }
                Err(e) => {
                    session.reset();
                    (old, Err(e))
                }
            }
        };

        match result {
            Ok(()) => {
                self.emit_state(old, PlaybackState::Playing);
                self.spawn_highlight_loop();
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to start audio stream");
                self.emit_state(old, PlaybackState::Stopped);
                Err(e)
            }
        }
    }

    /// Halt the stream and reset the session to Stopped
    fn halt(&self) {
        let old = {
            let mut session = self.session.lock();
            let old = session.state;
            if matches!(old, PlaybackState::Playing | PlaybackState::Paused) {
                self.backend.stop();
            }
            session.reset();
            old
        };
        self.emit_state(old, PlaybackState::Stopped);
        let _ = self.event_tx.send(PlaybackEvent::Stopped);
    }

    fn emit_state(&self, old: PlaybackState, new: PlaybackState) {
        if old != new {
            let _ = self.event_tx.send(PlaybackEvent::StateChanged { old, new });
        }
    }

    /// Replace the highlight loop with a fresh one for the new stream segment
    ///
    /// At most one loop is live; cancellation lands on the loop's sleep,
    /// never while it holds the session lock.
    fn spawn_highlight_loop(&self) {
        let mut guard = self.highlight_task.lock();
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let backend = Arc::clone(&self.backend);
        let session = Arc::clone(&self.session);
        let timings = Arc::clone(&self.timings);
        let event_tx = self.event_tx.clone();
        let poll_interval = self.poll_interval;

        *guard = Some(tokio::spawn(highlight_loop(
            backend,
            session,
            timings,
            event_tx,
            poll_interval,
        )));
    }
}

/// Polling highlight loop
///
/// Wakes at a fixed short interval, advances the word index monotonically
/// against the elapsed track position, and emits an event only when the
/// index changes. Exits when playback stops or the stream drains, in which
/// case the session transitions to Finished.
async fn highlight_loop(
    backend: Arc<dyn AudioBackend>,
    session: Arc<Mutex<PlaybackSession>>,
    timings: Arc<TimingTable>,
    event_tx: broadcast::Sender<PlaybackEvent>,
    poll_interval: Duration,
) {
    let mut interval = tokio::time::interval(poll_interval);

    loop {
        interval.tick().await;

        // All checks and emissions happen under the session lock: the
        // command handler mutates the stream under the same lock, so no
        // highlight event can land after a Stop and a mid-restart stream is
        // never mistaken for a drained one.
        let exit = {
            let mut session = session.lock();
            match session.state {
                PlaybackState::Stopped | PlaybackState::Finished => true,
                PlaybackState::Paused => false,
                PlaybackState::Playing => {
                    if !backend.is_busy() {
                        let old = session.state;
                        session.state = PlaybackState::Finished;
                        let _ = event_tx.send(PlaybackEvent::StateChanged {
                            old,
                            new: PlaybackState::Finished,
                        });
                        let _ = event_tx.send(PlaybackEvent::Finished);
                        true
                    } else {
                        let elapsed = session.elapsed_secs();
                        if let Some(index) = timings.index_at(elapsed) {
                            let advanced =
                                session.current_word.map_or(true, |current| index > current);
                            if advanced {
                                session.current_word = Some(index);
                                let _ = event_tx.send(PlaybackEvent::WordChanged { index });
                            }
                        }
                        false
                    }
                }
            }
        };

        if exit {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::StubBackend;
    use crate::timing;
    use read_along_core::SpeechEngine;

    fn controller(backend: Arc<StubBackend>) -> PlaybackController {
        let track = AudioTrack::new("/tmp/test.wav", 2.0, SpeechEngine::Espeak);
        let timings = timing::estimate("the quick brown fox", 2.0);
        let config = PlaybackConfig {
            poll_interval_ms: 10,
            seek_step_secs: 5.0,
        };
        PlaybackController::new(track, timings, backend, &config)
    }

    #[tokio::test]
    async fn test_play_starts_at_zero() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        assert_eq!(ctrl.state(), PlaybackState::Playing);
        assert_eq!(backend.play_offsets(), vec![0.0]);
    }

    #[tokio::test]
    async fn test_play_while_playing_is_noop() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        ctrl.handle(Command::Play).await.unwrap();
        assert_eq!(backend.play_offsets().len(), 1);
    }

    #[tokio::test]
    async fn test_pause_is_idempotent() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        ctrl.handle(Command::Pause).await.unwrap();
        ctrl.handle(Command::Pause).await.unwrap();

        assert_eq!(ctrl.state(), PlaybackState::Paused);
        assert_eq!(backend.pause_calls(), 1);
    }

    #[tokio::test]
    async fn test_pause_from_paused_only_accepts_legal_commands() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        ctrl.handle(Command::Pause).await.unwrap();

        // Play is ignored from Paused
        ctrl.handle(Command::Play).await.unwrap();
        assert_eq!(ctrl.state(), PlaybackState::Paused);
        assert_eq!(backend.play_offsets().len(), 1);

        // Resume is honored
        ctrl.handle(Command::Resume).await.unwrap();
        assert_eq!(ctrl.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_stop_resets_to_zero() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        ctrl.handle(Command::Stop).await.unwrap();

        assert_eq!(ctrl.state(), PlaybackState::Stopped);
        assert!(ctrl.elapsed_secs().abs() < 1e-9);
        assert_eq!(backend.stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_replay_restarts_from_zero() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        ctrl.handle(Command::Replay).await.unwrap();

        assert_eq!(ctrl.state(), PlaybackState::Playing);
        assert_eq!(backend.play_offsets(), vec![0.0, 0.0]);
        assert_eq!(backend.stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_seek_unsupported_leaves_state_unchanged() {
        let backend = Arc::new(StubBackend::unseekable());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let elapsed_before = ctrl.elapsed_secs();

        let err = ctrl.handle(Command::SeekRelative(-5.0)).await.unwrap_err();
        assert!(matches!(err, PlaybackError::SeekUnsupported));
        assert_eq!(ctrl.state(), PlaybackState::Playing);
        // no restart happened
        assert_eq!(backend.play_offsets().len(), 1);
        assert!(ctrl.elapsed_secs() >= elapsed_before);
    }

    #[tokio::test]
    async fn test_seek_clamps_at_track_start() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        ctrl.handle(Command::SeekRelative(-30.0)).await.unwrap();

        let offsets = backend.play_offsets();
        assert_eq!(offsets.len(), 2);
        assert!(offsets[1].abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_switch_mode_stops_and_reports() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        let outcome = ctrl
            .handle(Command::SwitchMode(PlaybackMode::Karaoke))
            .await
            .unwrap();

        assert_eq!(outcome, CommandOutcome::SwitchMode(PlaybackMode::Karaoke));
        assert_eq!(ctrl.state(), PlaybackState::Stopped);
        assert_eq!(backend.stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_quit_halts_backend_before_returning() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        let outcome = ctrl.handle(Command::Quit).await.unwrap();

        assert_eq!(outcome, CommandOutcome::Quit);
        assert!(!backend.is_busy());
        assert_eq!(ctrl.state(), PlaybackState::Stopped);
    }

    #[tokio::test]
    async fn test_drained_stream_finishes_session() {
        let backend = Arc::new(StubBackend::new());
        let ctrl = controller(backend.clone());

        ctrl.handle(Command::Play).await.unwrap();
        backend.finish();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(ctrl.state(), PlaybackState::Finished);
    }
}
