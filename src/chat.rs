//! Chat completion client
//!
//! Single-shot request/response: a fixed system instruction plus the
//! transcript as the sole user turn, no conversation history. The request
//! runs under a deadline enforced by client-side cancellation; on expiry
//! the in-flight request is dropped and a timeout error returned.

use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::{Error, Result};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Generates an assistant response from a transcript
#[derive(Clone)]
pub struct ResponseClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    config: ChatConfig,
}

impl ResponseClient {
    /// Create a new response client
    #[must_use]
    pub fn new(api_base: &str, api_key: &str, config: &ChatConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            config: config.clone(),
        }
    }

    /// Generate a response for the transcript
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the deadline expires, [`Error::Chat`]
    /// or [`Error::Http`] on any other failure.
    pub async fn generate(&self, transcript: &str) -> Result<String> {
        tokio::time::sleep(self.config.warmup).await;

        match tokio::time::timeout(self.config.timeout, self.request(transcript)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.config.timeout.as_secs(),
                    "response generation timed out, request aborted"
                );
                Err(Error::Timeout {
                    secs: self.config.timeout.as_secs(),
                })
            }
        }
    }

    async fn request(&self, transcript: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: transcript,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(Error::Chat(format!("chat API error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse chat response");
            e
        })?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Chat("empty completion".to_string()))?;

        tracing::info!(chars = text.len(), "response generated");
        Ok(text)
    }
}
