//! Audio track handle produced by the synthesis chain

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which speech engine produced a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEngine {
    /// Networked neural speech gateway (primary)
    Neural,
    /// Local espeak-ng engine (fallback)
    Espeak,
}

impl SpeechEngine {
    /// Short tag for logs and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechEngine::Neural => "neural",
            SpeechEngine::Espeak => "espeak",
        }
    }
}

impl std::fmt::Display for SpeechEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a synthesized audio artifact
///
/// Created by the provider chain, one per synthesis call; owned by the
/// playback controller for the session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Path to the audio file on disk
    pub path: PathBuf,

    /// Total duration in seconds, measured from the artifact
    pub duration_secs: f64,

    /// Engine that produced the audio
    pub engine: SpeechEngine,
}

impl AudioTrack {
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64, engine: SpeechEngine) -> Self {
        Self {
            path: path.into(),
            duration_secs,
            engine,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
