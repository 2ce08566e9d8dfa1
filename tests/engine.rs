//! Engine orchestration tests
//!
//! Runs without audio hardware or a network: the no-credential path never
//! reaches the microphone, and stale events exercise the gating.

use std::sync::Arc;

use parley::engine::{Command, Engine};
use parley::notice::MemorySink;
use parley::session::{Event, InteractionState};
use parley::Config;

fn engine_without_credential() -> (Engine, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let config = Config::default();
    assert!(config.api_key.is_none());
    let notices: Arc<dyn parley::notice::NoticeSink> = Arc::clone(&sink) as _;
    (Engine::new(&config, notices), sink)
}

#[tokio::test]
async fn mic_press_without_credential_never_opens_a_session() {
    let (mut engine, sink) = engine_without_credential();

    engine.handle_command(Command::Toggle).await;

    // Blocked before the permission check, state never leaves Idle
    assert_eq!(engine.state(), InteractionState::Idle);
    assert!(sink.has_title("Setup Required"));
    assert_eq!(sink.notices().len(), 1);
}

#[tokio::test]
async fn repeated_presses_without_credential_stay_idle() {
    let (mut engine, sink) = engine_without_credential();

    engine.handle_command(Command::Toggle).await;
    engine.handle_command(Command::Toggle).await;

    assert_eq!(engine.state(), InteractionState::Idle);
    assert_eq!(sink.notices().len(), 2);
}

#[tokio::test]
async fn stray_commands_are_ignored_when_idle() {
    let (mut engine, sink) = engine_without_credential();

    engine.handle_command(Command::Regenerate).await;
    engine.handle_command(Command::Replay).await;
    engine.handle_command(Command::Reset).await;

    assert_eq!(engine.state(), InteractionState::Idle);
    assert!(sink.notices().is_empty());
}

#[tokio::test]
async fn stale_completion_events_do_not_move_the_engine() {
    let (mut engine, sink) = engine_without_credential();

    engine.dispatch(Event::TranscriptReady("ghost".to_string())).await;
    engine.dispatch(Event::SpeechFinished).await;

    assert_eq!(engine.state(), InteractionState::Idle);
    assert_eq!(engine.session().transcript(), None);
    assert!(sink.notices().is_empty());
}
