//! Error types for read-along

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for read-along
#[derive(Error, Debug)]
pub enum Error {
    // Synthesis errors
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    // Playback errors
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Speech synthesis errors
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Both the primary and the fallback provider failed. Fatal to the
    /// request; no audio artifact is produced and no partial state is kept.
    #[error("Text-to-speech unavailable: primary and fallback providers failed")]
    TtsUnavailable,

    /// The input text contains no words. Rejected before any provider runs.
    #[error("Input text contains no words")]
    EmptyInput,

    #[error("Invalid rate spec '{0}': expected a signed percentage like \"+0%\"")]
    InvalidRateSpec(String),

    #[error("Invalid voice: {0}")]
    InvalidVoice(String),

    #[error("Provider timeout after {0}s")]
    Timeout(u64),

    #[error("Audio artifact error: {0}")]
    Artifact(String),
}

/// Playback control errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The backend cannot restart the stream at an arbitrary offset.
    /// Non-fatal: position and session state are left unchanged.
    #[error("Seek not supported for this audio format")]
    SeekUnsupported,

    /// Starting or stopping the audio stream failed. Propagated once; the
    /// session is forced to Stopped.
    #[error("Audio backend error: {0}")]
    BackendIo(String),

    #[error("No track loaded")]
    NoTrack,

    #[error("Channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::from(SynthesisError::TtsUnavailable);
        assert!(err.to_string().contains("unavailable"));

        let err = Error::from(PlaybackError::SeekUnsupported);
        assert!(err.to_string().contains("Seek"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
