//! Effect executor and orchestrator
//!
//! Owns the recorder, the network clients, speech output, and the session
//! state machine. User commands and completion events become session
//! events; the returned effects are executed one at a time, so no second
//! interaction cycle can start while one is in flight. Every error is
//! logged, surfaced as a notice, and resolved by resetting the state
//! machine; none propagates past the engine.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio::{AudioArtifact, Recorder};
use crate::chat::ResponseClient;
use crate::config::Config;
use crate::notice::{Notice, NoticeSink};
use crate::session::{Effect, Event, InteractionState, Session};
use crate::speech::{SpeechEvent, SpeechOutput, TextToSpeech};
use crate::stt::SpeechToText;
use crate::{Error, Result};

/// User commands from the frontend (terminal, keybinding, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start recording when idle, stop when recording
    Toggle,
    /// Request a new response for the current transcript
    Regenerate,
    /// Speak the current response again
    Replay,
    /// Clear the cycle and return to idle
    Reset,
}

/// Network clients, present only when a credential is configured
struct Clients {
    stt: SpeechToText,
    chat: ResponseClient,
    speech: SpeechOutput,
}

/// The interaction engine
pub struct Engine {
    recorder: Recorder,
    clients: Option<Clients>,
    session: Session,
    notices: Arc<dyn NoticeSink>,
    artifact: Option<AudioArtifact>,
    speech_rx: mpsc::Receiver<SpeechEvent>,
    // Keeps the speech event channel open when no clients exist
    _speech_tx: mpsc::Sender<SpeechEvent>,
}

impl Engine {
    /// Create an engine from configuration
    ///
    /// A missing API key does not fail construction; it blocks the start
    /// of any recording with a notice instead.
    #[must_use]
    pub fn new(config: &Config, notices: Arc<dyn NoticeSink>) -> Self {
        let (speech_tx, speech_rx) = mpsc::channel(8);

        let clients = config.api_key.as_deref().map(|key| Clients {
            stt: SpeechToText::new(&config.api_base, key, &config.stt),
            chat: ResponseClient::new(&config.api_base, key, &config.chat),
            speech: SpeechOutput::new(
                TextToSpeech::new(&config.api_base, key, &config.tts),
                speech_tx.clone(),
            ),
        });

        if clients.is_none() {
            tracing::warn!("no API key configured, recording will be blocked");
        }

        Self {
            recorder: Recorder::new(),
            clients,
            session: Session::new(),
            notices,
            artifact: None,
            speech_rx,
            _speech_tx: speech_tx,
        }
    }

    /// Current interaction state
    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.session.state()
    }

    /// The session's transcript/response view
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Run until the command channel closes
    ///
    /// # Errors
    ///
    /// Currently infallible at the loop level; every cycle error is
    /// surfaced as a notice instead of propagating.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Result<()> {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                Some(event) = self.speech_rx.recv() => {
                    let event = match event {
                        SpeechEvent::Started => Event::SpeechStarted,
                        SpeechEvent::Finished => Event::SpeechFinished,
                    };
                    self.dispatch(event).await;
                }
            }
        }

        tracing::info!("engine stopped");
        Ok(())
    }

    /// Apply a user command
    pub async fn handle_command(&mut self, cmd: Command) {
        tracing::debug!(?cmd, state = ?self.session.state(), "command");

        match cmd {
            Command::Toggle => match self.session.state() {
                InteractionState::Idle => self.begin_recording().await,
                InteractionState::Recording => self.dispatch(Event::StopPressed).await,
                state => tracing::debug!(?state, "toggle ignored"),
            },
            Command::Regenerate => self.dispatch(Event::RegeneratePressed).await,
            Command::Replay => self.dispatch(Event::ReplayPressed).await,
            Command::Reset => self.dispatch(Event::ResetPressed).await,
        }
    }

    /// Preconditions for Idle → Recording: credential first, then permission
    async fn begin_recording(&mut self) {
        if self.clients.is_none() {
            self.surface(&Error::Config("no API key configured".to_string()));
            return;
        }

        if !Recorder::request_permission() {
            self.surface(&Error::Permission);
            return;
        }

        self.dispatch(Event::MicPressed).await;
    }

    /// Feed an event through the state machine and execute the effects
    ///
    /// Effects can produce follow-up events (a finished transcription
    /// feeds response generation); those are drained in order before
    /// returning, so one call resolves as much of the cycle as it can.
    /// A failed effect skips the rest of its event's effects; the failure
    /// event alone resolves it, so one error surfaces one notice.
    pub async fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            for effect in self.session.handle(event) {
                if let Some(next) = self.execute(effect).await {
                    let failed = next.is_failure();
                    queue.push_back(next);
                    if failed {
                        break;
                    }
                }
            }
        }
    }

    /// Execute one effect, optionally yielding a follow-up event
    async fn execute(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::StartRecording => match self.recorder.start() {
                Ok(()) => None,
                Err(e) => {
                    self.surface(&e);
                    Some(Event::RecordingFailed)
                }
            },
            Effect::StopRecording => match self.recorder.stop() {
                Ok(artifact) => {
                    self.artifact = Some(artifact);
                    None
                }
                Err(e) => {
                    self.surface(&e);
                    Some(Event::RecordingFailed)
                }
            },
            Effect::Transcribe => {
                let Some(artifact) = self.artifact.take() else {
                    self.surface(&Error::Recording("no artifact to transcribe".to_string()));
                    return Some(Event::TranscriptFailed);
                };
                let Some(clients) = &self.clients else {
                    return Some(Event::TranscriptFailed);
                };

                match clients.stt.transcribe(artifact.wav_bytes()).await {
                    Ok(text) => Some(Event::TranscriptReady(text)),
                    Err(e) => {
                        self.surface(&e);
                        Some(Event::TranscriptFailed)
                    }
                }
            }
            Effect::Generate(transcript) => {
                let Some(clients) = &self.clients else {
                    return Some(Event::ResponseFailed);
                };

                match clients.chat.generate(&transcript).await {
                    Ok(text) => Some(Event::ResponseArrived(text)),
                    Err(e) => {
                        self.surface(&e);
                        Some(Event::ResponseFailed)
                    }
                }
            }
            Effect::Speak(text) => {
                if let Some(clients) = &self.clients {
                    clients.speech.speak(&text);
                }
                None
            }
        }
    }

    /// Log an error and surface it to the user
    fn surface(&self, err: &Error) {
        tracing::error!(error = %err, "interaction error");
        self.notices.notify(Notice::for_error(err));
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::Router;
    use axum::routing::post;

    use super::*;
    use crate::config::ChatConfig;
    use crate::notice::MemorySink;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn engine_with_key(config: Config) -> (Engine, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let notices: Arc<dyn NoticeSink> = Arc::clone(&sink) as _;
        let engine = Engine::new(&config, notices);
        (engine, sink)
    }

    #[tokio::test]
    async fn failed_stop_surfaces_one_notice_and_resets() {
        let config = Config {
            api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        let (mut engine, sink) = engine_with_key(config);

        engine.session.handle(Event::MicPressed);
        assert_eq!(engine.state(), InteractionState::Recording);

        // No capture session is open, so the stop effect fails. The
        // transcribe effect of the same event must not run on top of it.
        engine.dispatch(Event::StopPressed).await;

        assert_eq!(engine.state(), InteractionState::Idle);
        assert_eq!(sink.notices().len(), 1);
        assert!(sink.has_title("Recording Problem"));
    }

    #[tokio::test]
    async fn chat_timeout_surfaces_notice_and_resets_to_idle() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "never sent"
            }),
        );
        let addr = serve(app).await;

        let config = Config {
            api_base: format!("http://{addr}"),
            api_key: Some("sk-test".to_string()),
            chat: ChatConfig {
                warmup: Duration::from_millis(1),
                timeout: Duration::from_millis(100),
                ..ChatConfig::default()
            },
            ..Config::default()
        };
        let (mut engine, sink) = engine_with_key(config);

        // Walk the session into Processing without touching audio hardware
        engine.session.handle(Event::MicPressed);
        engine.session.handle(Event::StopPressed);

        engine
            .dispatch(Event::TranscriptReady("hello".to_string()))
            .await;

        assert_eq!(engine.state(), InteractionState::Idle);
        assert_eq!(sink.notices().len(), 1);
        assert!(sink.has_title("Response Timeout"));
    }

    #[tokio::test]
    async fn chat_api_error_surfaces_notice_and_resets_to_idle() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "down") }),
        );
        let addr = serve(app).await;

        let config = Config {
            api_base: format!("http://{addr}"),
            api_key: Some("sk-test".to_string()),
            chat: ChatConfig {
                warmup: Duration::from_millis(1),
                ..ChatConfig::default()
            },
            ..Config::default()
        };
        let (mut engine, sink) = engine_with_key(config);

        engine.session.handle(Event::MicPressed);
        engine.session.handle(Event::StopPressed);

        engine
            .dispatch(Event::TranscriptReady("hello".to_string()))
            .await;

        assert_eq!(engine.state(), InteractionState::Idle);
        assert!(sink.has_title("Response Failed"));
    }
}
