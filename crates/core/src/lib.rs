//! Core traits and types for read-along
//!
//! This crate provides foundational types used across all other crates:
//! - Audio track handles and engine tags
//! - Word timing tables
//! - Playback commands and modes
//! - Error types

pub mod command;
pub mod error;
pub mod timing;
pub mod track;

pub use command::{Command, PlaybackMode};
pub use error::{Error, PlaybackError, Result, SynthesisError};
pub use timing::{TimingTable, WordTiming};
pub use track::{AudioTrack, SpeechEngine};
