//! Networked neural speech gateway client
//!
//! Speaks the with-timestamps JSON contract of hosted TTS services: one POST
//! per synthesis call, the response carrying base64-encoded RIFF/WAV audio
//! and, when the voice supports it, per-word alignment marks in 100 ns ticks.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use read_along_core::SpeechEngine;

use super::{ProviderError, SpeechProvider, SynthesisRequest, SynthesizedSpeech, WordMark};

const OUTPUT_FORMAT: &str = "riff-24khz-16bit-mono-pcm";

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    text: &'a str,
    voice: &'a str,
    rate: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    /// Base64-encoded audio in the requested format
    audio: String,
    /// Word alignment marks; absent when the voice does not report them
    #[serde(default)]
    alignment: Option<Vec<GatewayMark>>,
}

#[derive(Debug, Deserialize)]
struct GatewayMark {
    word: String,
    offset_ticks: u64,
    duration_ticks: u64,
}

/// Client for the primary speech gateway
pub struct NeuralTtsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl NeuralTtsClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    fn synthesize_url(&self) -> String {
        format!("{}/v1/synthesize", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl SpeechProvider for NeuralTtsClient {
    fn engine(&self) -> SpeechEngine {
        SpeechEngine::Neural
    }

    async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedSpeech, ProviderError> {
        let body = GatewayRequest {
            text: &request.text,
            voice: &request.voice,
            rate: request.rate.as_str(),
            format: OUTPUT_FORMAT,
        };

        let mut http_request = self.http.post(self.synthesize_url()).json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http(format!(
                "gateway returned {status}: {detail}"
            )));
        }

        let payload: GatewayResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(&payload.audio)
            .map_err(|e| ProviderError::Decode(format!("audio payload: {e}")))?;

        tokio::fs::write(&request.out_path, &audio).await?;

        let word_marks = payload.alignment.map(|marks| {
            marks
                .into_iter()
                .map(|m| WordMark {
                    word: m.word,
                    offset_ticks: m.offset_ticks,
                    duration_ticks: m.duration_ticks,
                })
                .collect()
        });

        tracing::debug!(
            bytes = audio.len(),
            has_marks = word_marks.is_some(),
            "neural gateway synthesis complete"
        );

        Ok(SynthesizedSpeech {
            path: request.out_path.clone(),
            word_marks,
        })
    }
}
