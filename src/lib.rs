//! Parley - push-to-talk voice assistant engine
//!
//! One interaction cycle records microphone audio, transcribes it via a
//! speech-to-text API, forwards the transcript to a chat-completion API,
//! and speaks the response aloud.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Frontend                          │
//! │        Terminal commands (toggle/replay/...)         │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Engine + state machine                  │
//! │   Recorder │ STT (retry) │ Chat (timeout) │ Speech  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │          OpenAI-compatible HTTP endpoints            │
//! │   /audio/transcriptions │ /chat/completions │ /audio/speech
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The state machine ([`Session`]) is a pure transition function; the
//! [`Engine`] executes its effects, so retry, timeout, and orchestration
//! logic are each testable without audio hardware or a network.

pub mod audio;
pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod notice;
pub mod retry;
pub mod session;
pub mod speech;
pub mod stt;

pub use chat::ResponseClient;
pub use config::Config;
pub use engine::{Command, Engine};
pub use error::{Error, Result};
pub use notice::{MemorySink, Notice, NoticeSink, TerminalSink};
pub use retry::RetryPolicy;
pub use session::{Effect, Event, InteractionState, Session};
pub use speech::{SpeechEvent, SpeechOutput, TextToSpeech};
pub use stt::SpeechToText;
