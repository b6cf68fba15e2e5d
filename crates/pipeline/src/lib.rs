//! Speech synthesis, word timing, and playback control
//!
//! This crate provides the core read-along pipeline:
//! - Speech provider chain (networked neural gateway with local espeak fallback)
//! - Word timing tables (provider marks, or a weight-based estimate)
//! - Playback controller (state machine + polling highlight loop)
//! - Highlight rendering behind a pluggable sink

pub mod highlight;
pub mod playback;
pub mod synthesis;
pub mod timing;

// Synthesis exports
pub use synthesis::{
    RateSpec, SpeechProvider, SpeechSynthesizer, SynthesisOutcome, SynthesisRequest,
    SynthesizedSpeech, WordMark,
};

// Playback exports
pub use playback::{
    AudioBackend, CommandOutcome, PlaybackController, PlaybackEvent, PlaybackState, RodioBackend,
    StubBackend,
};

// Highlight exports
pub use highlight::{progress_percent, render_line, HighlightSink};
