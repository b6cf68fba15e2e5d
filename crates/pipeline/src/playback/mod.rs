//! Playback control
//!
//! A playback session is driven by two logically concurrent activities: the
//! audio backend producing sound, and a polling highlight loop mapping
//! elapsed time onto the word timing table. All session mutation goes through
//! the controller's command handler; the loop only takes snapshot reads.

mod backend;
mod controller;

pub use backend::{AudioBackend, RodioBackend, StubBackend};
pub use controller::{CommandOutcome, PlaybackController, PlaybackEvent};

use std::time::{Duration, Instant};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No active stream
    Stopped,
    /// Stream running, highlight loop live
    Playing,
    /// Stream halted mid-track, elapsed time frozen
    Paused,
    /// Stream drained to the end
    Finished,
}

/// Mutable state of one playback session
///
/// Owned by the controller; the command handler is the sole writer. Elapsed
/// time is derived from a monotonic clock so system clock adjustments cannot
/// skew the highlight position.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub state: PlaybackState,
    /// Track offset at which the current stream segment started
    base_offset_secs: f64,
    /// Monotonic instant the current segment started playing
    started_at: Option<Instant>,
    /// Completed pause intervals within the current segment
    paused_accumulated: Duration,
    /// Start of the pause currently in effect, if any
    pause_started_at: Option<Instant>,
    /// Last highlighted word index; None until the first highlight
    pub current_word: Option<usize>,
}

impl PlaybackSession {
    pub(crate) fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            base_offset_secs: 0.0,
            started_at: None,
            paused_accumulated: Duration::ZERO,
            pause_started_at: None,
            current_word: None,
        }
    }

    /// Rebuild the elapsed-time baseline at a track offset
    pub(crate) fn restart_at(&mut self, offset_secs: f64) {
        self.state = PlaybackState::Playing;
        self.base_offset_secs = offset_secs;
        self.started_at = Some(Instant::now());
        self.paused_accumulated = Duration::ZERO;
        self.pause_started_at = None;
        self.current_word = None;
    }

    pub(crate) fn freeze(&mut self) {
        self.pause_started_at = Some(Instant::now());
        self.state = PlaybackState::Paused;
    }

    pub(crate) fn unfreeze(&mut self) {
        if let Some(paused_at) = self.pause_started_at.take() {
            self.paused_accumulated += paused_at.elapsed();
        }
        self.state = PlaybackState::Playing;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Elapsed track position in seconds
    ///
    /// Frozen while paused; always measured against the monotonic baseline of
    /// the current stream segment plus the segment's start offset.
    pub fn elapsed_secs(&self) -> f64 {
        let Some(started_at) = self.started_at else {
            return self.base_offset_secs;
        };

        let reference = match self.pause_started_at {
            Some(paused_at) => paused_at.duration_since(started_at),
            None => started_at.elapsed(),
        };
        let active = reference.saturating_sub(self.paused_accumulated);
        self.base_offset_secs + active.as_secs_f64()
    }
}
