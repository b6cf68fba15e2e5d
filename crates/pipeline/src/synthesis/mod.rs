//! Speech provider chain
//!
//! Tries the networked neural gateway first and falls back to the local
//! espeak engine. Exactly two attempts per synthesis call; each attempt is
//! bounded by the configured timeout and a single failure is terminal for
//! that provider. Only the chain's terminal failure is surfaced.

mod espeak;
mod neural;

pub use espeak::EspeakProvider;
pub use neural::NeuralTtsClient;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use read_along_config::{Settings, RATE_SPEC_PATTERN};
use read_along_core::{AudioTrack, SpeechEngine, SynthesisError};

/// Synthesis rate relative to the provider default, as a signed percentage
/// string ("+0%", "-50%", "+100%")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSpec(String);

impl RateSpec {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RateSpec {
    fn default() -> Self {
        Self("+0%".to_string())
    }
}

impl FromStr for RateSpec {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if RATE_SPEC_PATTERN.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(SynthesisError::InvalidRateSpec(s.to_string()))
        }
    }
}

impl std::fmt::Display for RateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A per-word boundary mark reported by a provider, in its native time unit
/// of 100 ns ticks
#[derive(Debug, Clone, PartialEq)]
pub struct WordMark {
    pub word: String,
    pub offset_ticks: u64,
    pub duration_ticks: u64,
}

/// A single synthesis request handed to a provider
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    pub rate: RateSpec,
    /// Where the provider writes the audio artifact
    pub out_path: PathBuf,
}

/// What a provider produced for one request
#[derive(Debug)]
pub struct SynthesizedSpeech {
    pub path: PathBuf,
    /// Exact word boundaries, when the provider reports them
    pub word_marks: Option<Vec<WordMark>>,
}

/// Provider-internal failure. Caught by the chain to drive the fallback
/// decision; never surfaced individually.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// A speech synthesis backend
#[async_trait::async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Engine tag reported on produced tracks
    fn engine(&self) -> SpeechEngine;

    /// Synthesize the request into the artifact at `request.out_path`
    async fn synthesize(&self, request: &SynthesisRequest)
        -> Result<SynthesizedSpeech, ProviderError>;
}

/// Chain failure, kept typed so the two-step attempt logic stays explicit
#[derive(Error, Debug)]
pub(crate) enum ChainError {
    #[error("primary provider failed: {0}")]
    PrimaryFailed(ProviderError),

    #[error("both providers failed: primary: {primary}; fallback: {fallback}")]
    BothFailed {
        primary: ProviderError,
        fallback: ProviderError,
    },
}

/// Result of a successful chain run
#[derive(Debug)]
pub struct SynthesisOutcome {
    pub track: AudioTrack,
    pub word_marks: Option<Vec<WordMark>>,
}

/// Two-provider synthesis chain
///
/// The primary (networked, neural) provider honors the requested rate spec;
/// the fallback (local espeak) ignores fine-grained rate and speaks at a
/// fixed words-per-minute setting, so fallback audio speed may differ from
/// the requested speed. Callers can tell which engine ran from the track's
/// engine tag.
pub struct SpeechSynthesizer {
    primary: Arc<dyn SpeechProvider>,
    fallback: Arc<dyn SpeechProvider>,
    timeout: Duration,
    artifact_path: PathBuf,
}

impl SpeechSynthesizer {
    pub fn new(
        primary: Arc<dyn SpeechProvider>,
        fallback: Arc<dyn SpeechProvider>,
        timeout: Duration,
        artifact_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
            artifact_path: artifact_path.into(),
        }
    }

    /// Build the chain from settings: neural gateway primary, espeak fallback
    pub fn from_settings(settings: &Settings) -> Self {
        let synthesis = &settings.synthesis;
        Self::new(
            Arc::new(NeuralTtsClient::new(
                &synthesis.gateway_endpoint,
                synthesis.api_key.clone(),
            )),
            Arc::new(EspeakProvider::new(
                &synthesis.espeak_binary,
                synthesis.espeak_wpm,
            )),
            Duration::from_secs(synthesis.timeout_secs),
            &synthesis.artifact_path,
        )
    }

    /// Synthesize `text` and measure the produced artifact
    ///
    /// Rejects input with no words before any provider runs. On success the
    /// returned track carries the engine tag of whichever provider produced
    /// the audio.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        rate: RateSpec,
    ) -> Result<SynthesisOutcome, SynthesisError> {
        if text.split_whitespace().next().is_none() {
            return Err(SynthesisError::EmptyInput);
        }

        let request = SynthesisRequest {
            text: text.to_string(),
            voice: voice.to_string(),
            rate,
            out_path: self.artifact_path.clone(),
        };

        let (speech, engine) = match self.attempt_chain(&request).await {
            Ok(result) => result,
            Err(ChainError::BothFailed { primary, fallback }) => {
                tracing::error!(%primary, %fallback, "all speech providers failed");
                return Err(SynthesisError::TtsUnavailable);
            }
            Err(e @ ChainError::PrimaryFailed(_)) => {
                tracing::error!(error = %e, "speech chain aborted");
                return Err(SynthesisError::TtsUnavailable);
            }
        };

        let duration_secs = measure_wav_duration(&speech.path)?;
        tracing::info!(
            engine = %engine,
            duration_secs,
            path = %speech.path.display(),
            "synthesized speech artifact"
        );

        Ok(SynthesisOutcome {
            track: AudioTrack::new(speech.path, duration_secs, engine),
            word_marks: speech.word_marks,
        })
    }

    /// Explicit two-step attempt: primary, then fallback at its fixed rate
    async fn attempt_chain(
        &self,
        request: &SynthesisRequest,
    ) -> Result<(SynthesizedSpeech, SpeechEngine), ChainError> {
        match self.attempt_primary(request).await {
            Ok(speech) => Ok((speech, self.primary.engine())),
            Err(ChainError::PrimaryFailed(primary)) => {
                tracing::warn!(
                    error = %primary,
                    engine = %self.primary.engine(),
                    "primary speech provider failed, trying fallback"
                );
                match self.attempt(self.fallback.as_ref(), request).await {
                    Ok(speech) => Ok((speech, self.fallback.engine())),
                    Err(fallback) => Err(ChainError::BothFailed { primary, fallback }),
                }
            }
            Err(other) => Err(other),
        }
    }

    async fn attempt_primary(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedSpeech, ChainError> {
        self.attempt(self.primary.as_ref(), request)
            .await
            .map_err(ChainError::PrimaryFailed)
    }

    /// One bounded provider attempt; a timeout counts as a provider failure
    async fn attempt(
        &self,
        provider: &dyn SpeechProvider,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedSpeech, ProviderError> {
        match tokio::time::timeout(self.timeout, provider.synthesize(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }
}

/// Measure a WAV artifact's duration from its header
pub fn measure_wav_duration(path: &std::path::Path) -> Result<f64, SynthesisError> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| SynthesisError::Artifact(format!("{}: {e}", path.display())))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(SynthesisError::Artifact(format!(
            "{}: zero sample rate",
            path.display()
        )));
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}
