//! Configuration for the Parley engine
//!
//! All settings come from the environment at startup. The bearer token is
//! the only credential; its absence does not prevent startup but blocks the
//! start of any recording.

use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::{Error, Result};

/// Default API base URL (OpenAI-compatible endpoints)
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default deadline for response generation
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 10;

/// Warm-up delay before the chat request
const CHAT_WARMUP: Duration = Duration::from_millis(500);

/// Parley engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for the STT/chat/TTS endpoints
    pub api_base: String,

    /// Static bearer token; `None` blocks recording until configured
    pub api_key: Option<String>,

    /// Transcription settings
    pub stt: SttConfig,

    /// Response generation settings
    pub chat: ChatConfig,

    /// Speech synthesis settings
    pub tts: TtsConfig,
}

/// Transcription settings
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// STT model identifier (e.g. "whisper-1")
    pub model: String,

    /// Warm-up, retry, and backoff policy for the upload
    pub retry: RetryPolicy,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Response generation settings
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Chat model identifier
    pub model: String,

    /// Fixed system instruction sent with every request
    pub system_prompt: String,

    /// Warm-up delay before the request
    pub warmup: Duration,

    /// Deadline enforced via client-side cancellation
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            system_prompt: "You are a friendly assistant. Respond in English.".to_string(),
            warmup: CHAT_WARMUP,
            timeout: Duration::from_secs(DEFAULT_CHAT_TIMEOUT_SECS),
        }
    }
}

/// Speech synthesis settings
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// TTS model identifier (e.g. "tts-1")
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Speed multiplier (0.25 to 4.0)
    pub speed: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            speed: 1.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            stt: SttConfig::default(),
            chat: ChatConfig::default(),
            tts: TtsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the environment
    ///
    /// `PARLEY_API_KEY` takes priority over `OPENAI_API_KEY`; an empty value
    /// counts as absent.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("PARLEY_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let api_base = std::env::var("PARLEY_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let stt = SttConfig {
            model: std::env::var("PARLEY_STT_MODEL")
                .unwrap_or_else(|_| SttConfig::default().model),
            retry: RetryPolicy::default(),
        };

        let defaults = ChatConfig::default();
        let chat = ChatConfig {
            model: std::env::var("PARLEY_CHAT_MODEL").unwrap_or(defaults.model),
            system_prompt: std::env::var("PARLEY_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            warmup: defaults.warmup,
            timeout: std::env::var("PARLEY_CHAT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
        };

        let defaults = TtsConfig::default();
        let tts = TtsConfig {
            model: std::env::var("PARLEY_TTS_MODEL").unwrap_or(defaults.model),
            voice: std::env::var("PARLEY_TTS_VOICE").unwrap_or(defaults.voice),
            speed: std::env::var("PARLEY_TTS_SPEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.speed),
        };

        Self {
            api_base,
            api_key,
            stt,
            chat,
            tts,
        }
    }

    /// The bearer token, or a configuration error if none is set
    ///
    /// Checked eagerly before any recording session opens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no API key is configured.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("no API key configured".to_string()))
    }
}
