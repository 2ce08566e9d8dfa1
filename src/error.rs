//! Error types for the Parley engine

use thiserror::Error;

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during an interaction cycle
#[derive(Debug, Error)]
pub enum Error {
    /// Microphone permission denied or no capture device present
    #[error("microphone permission denied")]
    Permission,

    /// Configuration error (missing credential, bad settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Recording lifecycle error (capture failure, missing artifact)
    #[error("recording error: {0}")]
    Recording(String),

    /// Transcription endpoint rate limit, retry budget exhausted
    #[error("transcription rate limited after {attempts} attempts")]
    RateLimited {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Response generation exceeded its deadline
    #[error("response generation timed out after {secs}s")]
    Timeout {
        /// Deadline that was exceeded, in seconds
        secs: u64,
    },

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Chat completion error
    #[error("chat error: {0}")]
    Chat(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio device, encode, or playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
