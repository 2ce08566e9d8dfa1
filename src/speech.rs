//! Speech output
//!
//! Synthesizes a response via a TTS endpoint and plays it aloud on a
//! spawned task; fire-and-forget from the caller's view. The engine
//! observes start and completion via [`SpeechEvent`]s.
//!
//! Overlap policy: ignore-while-active. A `speak` while synthesis or
//! playback is running is dropped with a warning. The state machine keeps
//! the replay control out of the Speaking state, so this only guards the
//! direct API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::audio::AudioPlayback;
use crate::config::TtsConfig;
use crate::{Error, Result};

/// Lifecycle events emitted by speech output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Synthesis has begun
    Started,
    /// Playback finished (or failed after being surfaced)
    Finished,
}

/// Synthesizes speech from text via an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct TextToSpeech {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    config: TtsConfig,
}

impl TextToSpeech {
    /// Create a new TTS client
    #[must_use]
    pub fn new(api_base: &str, api_key: &str, config: &TtsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            config: config.clone(),
        }
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.config.model,
            input: text,
            voice: &self.config.voice,
            speed: self.config.speed,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

/// Speaks generated responses, reporting lifecycle events to the engine
pub struct SpeechOutput {
    tts: TextToSpeech,
    events: mpsc::Sender<SpeechEvent>,
    active: Arc<AtomicBool>,
}

impl SpeechOutput {
    /// Create speech output reporting on the given channel
    #[must_use]
    pub fn new(tts: TextToSpeech, events: mpsc::Sender<SpeechEvent>) -> Self {
        Self {
            tts,
            events,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether synthesis or playback is currently running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Begin speaking the text asynchronously
    ///
    /// Ignored when speech is already active. Synthesis or playback
    /// failures are logged; `Finished` is emitted either way so the state
    /// machine always returns to rest.
    pub fn speak(&self, text: &str) {
        if self.active.swap(true, Ordering::SeqCst) {
            tracing::warn!("speech already active, ignoring");
            return;
        }

        let tts = self.tts.clone();
        let events = self.events.clone();
        let active = Arc::clone(&self.active);
        let text = text.to_string();

        tokio::spawn(async move {
            let _ = events.send(SpeechEvent::Started).await;

            match tts.synthesize(&text).await {
                Ok(mp3) => {
                    let played = tokio::task::spawn_blocking(move || {
                        AudioPlayback::new()?.play_mp3(&mp3)
                    })
                    .await
                    .unwrap_or_else(|e| Err(Error::Audio(e.to_string())));

                    if let Err(e) = played {
                        tracing::error!(error = %e, "speech playback failed");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "speech synthesis failed");
                }
            }

            active.store(false, Ordering::SeqCst);
            let _ = events.send(SpeechEvent::Finished).await;
        });
    }
}
