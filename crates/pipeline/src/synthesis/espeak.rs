//! Local espeak fallback provider
//!
//! Shells out to the espeak-ng binary, writing a WAV artifact. The engine
//! speaks at a fixed words-per-minute setting and does not honor fine-grained
//! rate specs; it never reports word boundaries.

use tokio::process::Command;

use read_along_core::SpeechEngine;

use super::{ProviderError, SpeechProvider, SynthesisRequest, SynthesizedSpeech};

/// Offline espeak-ng provider
pub struct EspeakProvider {
    binary: String,
    words_per_minute: u32,
}

impl EspeakProvider {
    pub fn new(binary: impl Into<String>, words_per_minute: u32) -> Self {
        Self {
            binary: binary.into(),
            words_per_minute,
        }
    }

    /// Map a gateway voice id onto espeak's voice namespace
    ///
    /// Gateway voices look like "en-US-AriaNeural"; espeak only understands
    /// language tags, so the leading tag is kept and the rest dropped.
    fn voice_tag(voice: &str) -> String {
        voice
            .split('-')
            .next()
            .filter(|tag| !tag.is_empty())
            .unwrap_or("en")
            .to_ascii_lowercase()
    }
}

#[async_trait::async_trait]
impl SpeechProvider for EspeakProvider {
    fn engine(&self) -> SpeechEngine {
        SpeechEngine::Espeak
    }

    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedSpeech, ProviderError> {
        let output = Command::new(&self.binary)
            .arg("-w")
            .arg(&request.out_path)
            .arg("-s")
            .arg(self.words_per_minute.to_string())
            .arg("-v")
            .arg(Self::voice_tag(&request.voice))
            .arg(&request.text)
            .output()
            .await
            .map_err(|e| ProviderError::Process(format!("{}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Process(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!(
            wpm = self.words_per_minute,
            path = %request.out_path.display(),
            "espeak synthesis complete"
        );

        Ok(SynthesizedSpeech {
            path: request.out_path.clone(),
            word_marks: None,
        })
    }
}
