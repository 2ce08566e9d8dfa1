//! Speech-to-text client
//!
//! Uploads a finished WAV artifact as multipart form data. The upload runs
//! under the bounded retry policy: a warm-up delay before the first attempt,
//! exponential backoff on HTTP 429, and immediate failure on anything else.
//! There is no cancellation; a slow upload runs to completion or exhausts
//! its retry budget.

use reqwest::StatusCode;

use crate::config::SttConfig;
use crate::retry::{self, RetryPolicy};
use crate::{Error, Result};

/// Response from the transcription endpoint
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes recorded audio via an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct SpeechToText {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    policy: RetryPolicy,
}

impl SpeechToText {
    /// Create a new STT client
    #[must_use]
    pub fn new(api_base: &str, api_key: &str, config: &SttConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            policy: config.retry.clone(),
        }
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns [`Error::RateLimited`] when the retry budget is exhausted,
    /// [`Error::Stt`] or [`Error::Http`] on any other failure.
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let text =
            retry::retry_rate_limited(&self.policy, |attempt| self.attempt(audio, attempt)).await?;

        tracing::info!(transcript = %text, "transcription complete");
        Ok(text)
    }

    /// One upload attempt
    async fn attempt(&self, audio: &[u8], attempt: u32) -> Result<String> {
        tracing::debug!(attempt, audio_bytes = audio.len(), "uploading recording");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("recording.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.api_base))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(attempt, "transcription endpoint rate limited");
            return Err(Error::RateLimited { attempts: attempt });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        Ok(result.text)
    }
}
