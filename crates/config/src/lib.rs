//! Configuration for read-along
//!
//! Settings are layered: `config/default.toml`, an optional per-environment
//! file, then `READ_ALONG__`-prefixed environment variables.

mod settings;

pub use settings::{
    load_settings, HighlightConfig, ObservabilityConfig, PlaybackConfig, Settings,
    SynthesisConfig, RATE_SPEC_PATTERN,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
