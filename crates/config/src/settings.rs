//! Main settings module

use config::{Config, Environment, File};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Pattern a synthesis rate spec must match: a signed percentage like "+0%"
pub static RATE_SPEC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]\d+%$").expect("rate spec regex"));

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Speech synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Playback configuration
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Highlight rendering configuration
    #[serde(default)]
    pub highlight: HighlightConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !RATE_SPEC_PATTERN.is_match(&self.synthesis.default_rate) {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.default_rate".to_string(),
                message: format!(
                    "'{}' is not a signed percentage like \"+0%\"",
                    self.synthesis.default_rate
                ),
            });
        }

        if self.synthesis.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.timeout_secs".to_string(),
                message: "Provider timeout must be positive".to_string(),
            });
        }

        if self.playback.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "playback.poll_interval_ms".to_string(),
                message: "Highlight poll interval must be positive".to_string(),
            });
        }

        if self.playback.seek_step_secs <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "playback.seek_step_secs".to_string(),
                message: "Seek step must be positive".to_string(),
            });
        }

        if self.highlight.words_per_line == 0 {
            return Err(ConfigError::InvalidValue {
                field: "highlight.words_per_line".to_string(),
                message: "Highlight window must hold at least one word".to_string(),
            });
        }

        Ok(())
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Speech gateway endpoint for the primary neural provider
    #[serde(default = "default_gateway_endpoint")]
    pub gateway_endpoint: String,

    /// API key for the gateway (usually set via READ_ALONG__SYNTHESIS__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default voice identifier
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// Default rate spec (signed percentage)
    #[serde(default = "default_rate")]
    pub default_rate: String,

    /// Per-provider timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Words per minute for the local espeak fallback (fine-grained rate
    /// specs are not honored by the fallback engine)
    #[serde(default = "default_espeak_wpm")]
    pub espeak_wpm: u32,

    /// Path of the espeak binary
    #[serde(default = "default_espeak_binary")]
    pub espeak_binary: String,

    /// Where synthesized audio artifacts are written
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
}

fn default_gateway_endpoint() -> String {
    "http://127.0.0.1:8123".to_string()
}
fn default_voice() -> String {
    "en-US-AriaNeural".to_string()
}
fn default_rate() -> String {
    "+0%".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_espeak_wpm() -> u32 {
    150
}
fn default_espeak_binary() -> String {
    "espeak-ng".to_string()
}
fn default_artifact_path() -> String {
    "output.wav".to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            gateway_endpoint: default_gateway_endpoint(),
            api_key: None,
            default_voice: default_voice(),
            default_rate: default_rate(),
            timeout_secs: default_timeout_secs(),
            espeak_wpm: default_espeak_wpm(),
            espeak_binary: default_espeak_binary(),
            artifact_path: default_artifact_path(),
        }
    }
}

/// Playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Highlight loop poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Rewind/forward step in seconds
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,
}

fn default_poll_interval_ms() -> u64 {
    50
}
fn default_seek_step_secs() -> f64 {
    5.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            seek_step_secs: default_seek_step_secs(),
        }
    }
}

/// Highlight rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Words per rendered window
    #[serde(default = "default_words_per_line")]
    pub words_per_line: usize,

    /// Maximum rendered line length before truncation
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,
}

fn default_words_per_line() -> usize {
    10
}
fn default_max_line_chars() -> usize {
    120
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            words_per_line: default_words_per_line(),
            max_line_chars: default_max_line_chars(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (READ_ALONG__ prefix)
/// 2. config/{env}.toml (if env specified)
/// 3. config/default.toml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("READ_ALONG")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
