//! Audio output backends
//!
//! The controller treats the backend as an opaque execution context: it only
//! starts, halts, and queries it. `RodioBackend` drives a real output device;
//! `StubBackend` records calls for tests and headless runs, in the spirit of
//! the `::simple()` constructors elsewhere in the pipeline.

use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rodio::{Decoder, OutputStreamHandle, Sink, Source};

use read_along_core::{AudioTrack, PlaybackError};

/// An audio output stream the controller can start, halt, and query
pub trait AudioBackend: Send + Sync {
    /// Start playing `track` at `offset` from the track start
    ///
    /// Replaces any stream already playing. Starting at a non-zero offset on
    /// a track the backend cannot seek within returns `SeekUnsupported` and
    /// leaves the previous stream state untouched.
    fn play(&self, track: &AudioTrack, offset: Duration) -> Result<(), PlaybackError>;

    /// Halt sound output, keeping the stream position
    fn pause(&self);

    /// Resume a paused stream
    fn resume(&self);

    /// Stop and discard the current stream
    fn stop(&self);

    /// Is the stream still producing (or paused mid-) sound?
    fn is_busy(&self) -> bool;

    /// Can playback of this track be restarted at an arbitrary offset?
    fn supports_seek(&self, track: &AudioTrack) -> bool;
}

/// Backend driving the default output device through rodio
///
/// The rodio `OutputStream` is not `Send`, so a dedicated thread owns it for
/// the lifetime of the backend; the `Sink` handles are shared freely.
pub struct RodioBackend {
    handle: OutputStreamHandle,
    sink: Mutex<Option<Arc<Sink>>>,
    /// Dropping this unblocks the output-stream thread
    _shutdown_tx: mpsc::Sender<()>,
}

impl RodioBackend {
    pub fn new() -> Result<Self, PlaybackError> {
        let (init_tx, init_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match rodio::OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = init_tx.send(Ok(handle));
                    // hold the device open until the backend is dropped
                    let _ = shutdown_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| PlaybackError::BackendIo(format!("spawn audio thread: {e}")))?;

        let handle = init_rx
            .recv()
            .map_err(|_| PlaybackError::BackendIo("audio thread died".to_string()))?
            .map_err(PlaybackError::BackendIo)?;

        Ok(Self {
            handle,
            sink: Mutex::new(None),
            _shutdown_tx: shutdown_tx,
        })
    }

    fn open_decoder(track: &AudioTrack) -> Result<Decoder<BufReader<File>>, PlaybackError> {
        let file = File::open(track.path())
            .map_err(|e| PlaybackError::BackendIo(format!("{}: {e}", track.path().display())))?;
        Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::BackendIo(format!("decode {}: {e}", track.path().display())))
    }

    fn current_sink(&self) -> Option<Arc<Sink>> {
        self.sink.lock().clone()
    }
}

impl AudioBackend for RodioBackend {
    fn play(&self, track: &AudioTrack, offset: Duration) -> Result<(), PlaybackError> {
        let decoder = Self::open_decoder(track)?;

        if !offset.is_zero() && decoder.total_duration().is_none() {
            return Err(PlaybackError::SeekUnsupported);
        }

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| PlaybackError::BackendIo(format!("open sink: {e}")))?;
        if offset.is_zero() {
            sink.append(decoder);
        } else {
            sink.append(decoder.skip_duration(offset));
        }

        let mut guard = self.sink.lock();
        if let Some(old) = guard.take() {
            old.stop();
        }
        *guard = Some(Arc::new(sink));
        Ok(())
    }

    fn pause(&self) {
        if let Some(sink) = self.current_sink() {
            sink.pause();
        }
    }

    fn resume(&self) {
        if let Some(sink) = self.current_sink() {
            sink.play();
        }
    }

    fn stop(&self) {
        if let Some(sink) = self.sink.lock().take() {
            sink.stop();
        }
    }

    fn is_busy(&self) -> bool {
        self.current_sink().map(|sink| !sink.empty()).unwrap_or(false)
    }

    fn supports_seek(&self, track: &AudioTrack) -> bool {
        Self::open_decoder(track)
            .map(|decoder| decoder.total_duration().is_some())
            .unwrap_or(false)
    }
}

/// Recording backend for tests and headless runs
///
/// Stays busy from `play` until `stop` or an explicit `finish` call, which
/// lets tests drive the highlight loop's end-of-stream transition.
#[derive(Default)]
pub struct StubBackend {
    seekable: bool,
    busy: AtomicBool,
    paused: AtomicBool,
    play_offsets: Mutex<Vec<f64>>,
    stop_calls: AtomicUsize,
    pause_calls: AtomicUsize,
    resume_calls: AtomicUsize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            seekable: true,
            ..Self::default()
        }
    }

    /// A backend that reports offset restarts as unsupported
    pub fn unseekable() -> Self {
        Self {
            seekable: false,
            ..Self::default()
        }
    }

    /// Simulate the stream draining to its end
    pub fn finish(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    pub fn play_offsets(&self) -> Vec<f64> {
        self.play_offsets.lock().clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn pause_calls(&self) -> usize {
        self.pause_calls.load(Ordering::SeqCst)
    }

    pub fn resume_calls(&self) -> usize {
        self.resume_calls.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

impl AudioBackend for StubBackend {
    fn play(&self, _track: &AudioTrack, offset: Duration) -> Result<(), PlaybackError> {
        if !offset.is_zero() && !self.seekable {
            return Err(PlaybackError::SeekUnsupported);
        }
        self.play_offsets.lock().push(offset.as_secs_f64());
        self.busy.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn supports_seek(&self, _track: &AudioTrack) -> bool {
        self.seekable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use read_along_core::SpeechEngine;

    fn track() -> AudioTrack {
        AudioTrack::new("/tmp/test.wav", 2.0, SpeechEngine::Espeak)
    }

    #[test]
    fn test_stub_records_plays_and_stops() {
        let backend = StubBackend::new();
        backend.play(&track(), Duration::ZERO).unwrap();
        assert!(backend.is_busy());

        backend.stop();
        assert!(!backend.is_busy());
        assert_eq!(backend.stop_calls(), 1);
        assert_eq!(backend.play_offsets(), vec![0.0]);
    }

    #[test]
    fn test_stub_unseekable_rejects_offset_play() {
        let backend = StubBackend::unseekable();
        backend.play(&track(), Duration::ZERO).unwrap();

        let err = backend.play(&track(), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, PlaybackError::SeekUnsupported));
        // the rejected restart must not have disturbed the stream
        assert!(backend.is_busy());
    }

    #[test]
    fn test_stub_finish_simulates_drain() {
        let backend = StubBackend::new();
        backend.play(&track(), Duration::ZERO).unwrap();
        backend.finish();
        assert!(!backend.is_busy());
        assert_eq!(backend.stop_calls(), 0);
    }
}
