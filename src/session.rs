//! Interaction state machine
//!
//! One interaction cycle moves through Idle → Recording → Processing →
//! ResponseReady → Speaking → ResponseReady, with exactly one state active
//! at a time. Transitions happen only through [`Session::handle`], which is
//! a pure function from (state, event) to the next state plus the effects
//! the engine must execute. Events that do not apply in the current state
//! are ignored, which is what gates re-entrant user actions; no second
//! operation can start while one is in flight.
//!
//! Replay speaks the stored response directly from `ResponseReady` rather
//! than re-entering `Processing`: nothing is being computed, and the
//! `Speaking` state is entered as usual once speech actually starts.

/// The single owned interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    /// Awaiting a user-initiated recording
    Idle,
    /// Microphone capture active
    Recording,
    /// Transcription or response generation in flight
    Processing,
    /// A response is available for speaking, replay, or regeneration
    ResponseReady,
    /// Speech output active
    Speaking,
}

/// Inputs to the state machine: user actions and completed async operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// User pressed the microphone control
    MicPressed,
    /// User pressed stop
    StopPressed,
    /// Recording could not start or stop
    RecordingFailed,
    /// Transcription succeeded
    TranscriptReady(String),
    /// Transcription failed (error already surfaced)
    TranscriptFailed,
    /// Response generation succeeded
    ResponseArrived(String),
    /// Response generation failed (error already surfaced)
    ResponseFailed,
    /// Speech output began
    SpeechStarted,
    /// Speech output completed
    SpeechFinished,
    /// User pressed back/reset
    ResetPressed,
    /// User asked for a new response to the same transcript
    RegeneratePressed,
    /// User asked to hear the response again
    ReplayPressed,
}

/// Side effects the engine executes after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the capture session
    StartRecording,
    /// Close the capture session and finalize the artifact
    StopRecording,
    /// Upload the pending artifact for transcription
    Transcribe,
    /// Request a response for the transcript
    Generate(String),
    /// Speak the response text
    Speak(String),
}

/// Holds the interaction state and the current transcript/response
///
/// Both strings live only for the current cycle; reset clears them and
/// nothing persists across process restarts.
#[derive(Debug, Default)]
pub struct Session {
    state: InteractionState,
    transcript: Option<String>,
    response: Option<String>,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl Event {
    /// Whether this event reports a failed effect
    ///
    /// A failure invalidates the remaining effects of the event that
    /// produced it; the engine stops executing them and feeds the failure
    /// back instead.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::RecordingFailed | Self::TranscriptFailed | Self::ResponseFailed
        )
    }
}

impl Session {
    /// Create a session in the idle state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.state
    }

    /// Transcript of the current cycle, if any
    #[must_use]
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Generated response of the current cycle, if any
    #[must_use]
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Apply an event, returning the effects to execute
    ///
    /// Events that do not apply in the current state return no effects and
    /// leave the state unchanged.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        use InteractionState as S;

        let from = self.state;
        let effects = match (from, event) {
            (S::Idle, Event::MicPressed) => {
                self.state = S::Recording;
                vec![Effect::StartRecording]
            }
            (S::Recording, Event::StopPressed) => {
                self.state = S::Processing;
                vec![Effect::StopRecording, Effect::Transcribe]
            }
            (S::Recording | S::Processing, Event::RecordingFailed) => {
                self.state = S::Idle;
                vec![]
            }
            (S::Processing, Event::TranscriptReady(text)) => {
                self.transcript = Some(text.clone());
                vec![Effect::Generate(text)]
            }
            (S::Processing, Event::TranscriptFailed | Event::ResponseFailed) => {
                self.state = S::Idle;
                vec![]
            }
            (S::Processing, Event::ResponseArrived(text)) => {
                self.response = Some(text.clone());
                self.state = S::ResponseReady;
                vec![Effect::Speak(text)]
            }
            (S::ResponseReady, Event::SpeechStarted) => {
                self.state = S::Speaking;
                vec![]
            }
            (S::Speaking, Event::SpeechFinished) => {
                self.state = S::ResponseReady;
                vec![]
            }
            (S::ResponseReady, Event::ResetPressed) => {
                self.transcript = None;
                self.response = None;
                self.state = S::Idle;
                vec![]
            }
            (S::ResponseReady, Event::RegeneratePressed) => {
                self.transcript.clone().map_or_else(Vec::new, |transcript| {
                    self.state = S::Processing;
                    vec![Effect::Generate(transcript)]
                })
            }
            (S::ResponseReady, Event::ReplayPressed) => self
                .response
                .clone()
                .map_or_else(Vec::new, |response| vec![Effect::Speak(response)]),
            (state, event) => {
                tracing::debug!(?state, ?event, "event ignored in current state");
                vec![]
            }
        };

        if from != self.state {
            tracing::debug!(?from, to = ?self.state, "state transition");
        }

        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at_response_ready(transcript: &str, response: &str) -> Session {
        let mut session = Session::new();
        session.handle(Event::MicPressed);
        session.handle(Event::StopPressed);
        session.handle(Event::TranscriptReady(transcript.to_string()));
        session.handle(Event::ResponseArrived(response.to_string()));
        session
    }

    #[test]
    fn successful_cycle_visits_each_state_once() {
        let mut session = Session::new();
        assert_eq!(session.state(), InteractionState::Idle);

        assert_eq!(
            session.handle(Event::MicPressed),
            vec![Effect::StartRecording]
        );
        assert_eq!(session.state(), InteractionState::Recording);

        assert_eq!(
            session.handle(Event::StopPressed),
            vec![Effect::StopRecording, Effect::Transcribe]
        );
        assert_eq!(session.state(), InteractionState::Processing);

        assert_eq!(
            session.handle(Event::TranscriptReady("hi there".to_string())),
            vec![Effect::Generate("hi there".to_string())]
        );
        assert_eq!(session.state(), InteractionState::Processing);

        assert_eq!(
            session.handle(Event::ResponseArrived("hello!".to_string())),
            vec![Effect::Speak("hello!".to_string())]
        );
        assert_eq!(session.state(), InteractionState::ResponseReady);

        assert!(session.handle(Event::SpeechStarted).is_empty());
        assert_eq!(session.state(), InteractionState::Speaking);

        assert!(session.handle(Event::SpeechFinished).is_empty());
        assert_eq!(session.state(), InteractionState::ResponseReady);
    }

    #[test]
    fn mic_press_gated_outside_idle() {
        let mut session = Session::new();
        session.handle(Event::MicPressed);

        // Re-entrant press while recording does nothing
        assert!(session.handle(Event::MicPressed).is_empty());
        assert_eq!(session.state(), InteractionState::Recording);

        session.handle(Event::StopPressed);
        assert!(session.handle(Event::MicPressed).is_empty());
        assert_eq!(session.state(), InteractionState::Processing);
    }

    #[test]
    fn transcription_failure_resets_to_idle() {
        let mut session = Session::new();
        session.handle(Event::MicPressed);
        session.handle(Event::StopPressed);

        assert!(session.handle(Event::TranscriptFailed).is_empty());
        assert_eq!(session.state(), InteractionState::Idle);
    }

    #[test]
    fn response_failure_resets_to_idle() {
        let mut session = Session::new();
        session.handle(Event::MicPressed);
        session.handle(Event::StopPressed);
        session.handle(Event::TranscriptReady("hi".to_string()));

        assert!(session.handle(Event::ResponseFailed).is_empty());
        assert_eq!(session.state(), InteractionState::Idle);
        // Transcript is retained only until the cycle resolves or resets
        assert_eq!(session.transcript(), Some("hi"));
    }

    #[test]
    fn recording_failure_resets_to_idle() {
        let mut session = Session::new();
        session.handle(Event::MicPressed);

        assert!(session.handle(Event::RecordingFailed).is_empty());
        assert_eq!(session.state(), InteractionState::Idle);
    }

    #[test]
    fn regenerate_reuses_exact_transcript_without_recording() {
        let mut session = session_at_response_ready("Hello", "Hi!");

        let effects = session.handle(Event::RegeneratePressed);
        assert_eq!(effects, vec![Effect::Generate("Hello".to_string())]);
        assert_eq!(session.state(), InteractionState::Processing);

        // Completes without passing through Recording
        let effects = session.handle(Event::ResponseArrived("Hi again!".to_string()));
        assert_eq!(effects, vec![Effect::Speak("Hi again!".to_string())]);
        assert_eq!(session.state(), InteractionState::ResponseReady);
        assert_eq!(session.response(), Some("Hi again!"));
    }

    #[test]
    fn replay_respeaks_stored_response() {
        let mut session = session_at_response_ready("Hello", "Hi!");

        let effects = session.handle(Event::ReplayPressed);
        assert_eq!(effects, vec![Effect::Speak("Hi!".to_string())]);
        assert_eq!(session.state(), InteractionState::ResponseReady);

        // Speech start then moves to Speaking as usual
        session.handle(Event::SpeechStarted);
        assert_eq!(session.state(), InteractionState::Speaking);
    }

    #[test]
    fn replay_gated_while_speaking() {
        let mut session = session_at_response_ready("Hello", "Hi!");
        session.handle(Event::SpeechStarted);

        assert!(session.handle(Event::ReplayPressed).is_empty());
        assert!(session.handle(Event::RegeneratePressed).is_empty());
        assert_eq!(session.state(), InteractionState::Speaking);
    }

    #[test]
    fn reset_clears_transcript_and_response() {
        let mut session = session_at_response_ready("Hello", "Hi!");

        assert!(session.handle(Event::ResetPressed).is_empty());
        assert_eq!(session.state(), InteractionState::Idle);
        assert_eq!(session.transcript(), None);
        assert_eq!(session.response(), None);

        // Back at the cycle's terminal state, a new recording can start
        assert_eq!(
            session.handle(Event::MicPressed),
            vec![Effect::StartRecording]
        );
    }

    #[test]
    fn stale_completion_events_ignored_when_idle() {
        let mut session = Session::new();

        assert!(session.handle(Event::TranscriptReady("x".to_string())).is_empty());
        assert!(session.handle(Event::ResponseArrived("y".to_string())).is_empty());
        assert!(session.handle(Event::SpeechFinished).is_empty());
        assert_eq!(session.state(), InteractionState::Idle);
        assert_eq!(session.transcript(), None);
    }
}
