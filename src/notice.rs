//! User-facing notices
//!
//! Every failure in an interaction cycle is surfaced to the user as a short
//! title/message pair with no machine-readable code, then the state machine
//! resets. The sink trait lets the CLI print to the terminal while tests
//! record notices for inspection.

use std::sync::Mutex;

use crate::Error;

/// A short user-facing alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Short heading
    pub title: String,
    /// One-sentence explanation
    pub message: String,
}

impl Notice {
    /// Build a notice from an error
    #[must_use]
    pub fn for_error(err: &Error) -> Self {
        let (title, message) = match err {
            Error::Permission => (
                "Microphone Access",
                "Permission to use the microphone was denied.".to_string(),
            ),
            Error::Config(_) => (
                "Setup Required",
                "No API key is configured. Set OPENAI_API_KEY and restart.".to_string(),
            ),
            Error::Recording(_) => (
                "Recording Problem",
                "The recording could not be completed. Please try again.".to_string(),
            ),
            Error::RateLimited { .. } => (
                "Rate Limited",
                "The transcription service is busy. Please try again in a moment.".to_string(),
            ),
            Error::Timeout { secs } => (
                "Response Timeout",
                format!("The assistant did not answer within {secs} seconds."),
            ),
            Error::Stt(_) => (
                "Transcription Failed",
                "Your recording could not be transcribed.".to_string(),
            ),
            Error::Chat(_) => (
                "Response Failed",
                "The assistant could not generate a response.".to_string(),
            ),
            Error::Tts(_) | Error::Audio(_) => (
                "Playback Problem",
                "The response could not be spoken aloud.".to_string(),
            ),
            Error::Io(_) | Error::Http(_) | Error::Serialization(_) => (
                "Something Went Wrong",
                "An unexpected error occurred. Please try again.".to_string(),
            ),
        };

        Self {
            title: title.to_string(),
            message,
        }
    }
}

/// Destination for user-facing notices
pub trait NoticeSink: Send + Sync {
    /// Surface a notice to the user
    fn notify(&self, notice: Notice);
}

/// Prints notices to stderr, the terminal stand-in for a modal alert
pub struct TerminalSink;

impl NoticeSink for TerminalSink {
    fn notify(&self, notice: Notice) {
        eprintln!("\n!! {}: {}\n", notice.title, notice.message);
    }
}

/// Records notices in memory for test assertions
#[derive(Default)]
pub struct MemorySink {
    notices: Mutex<Vec<Notice>>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded notices
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Whether a notice with the given title was recorded
    #[must_use]
    pub fn has_title(&self, title: &str) -> bool {
        self.notices().iter().any(|n| n.title == title)
    }
}

impl NoticeSink for MemorySink {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_rate_limited_title() {
        let notice = Notice::for_error(&Error::RateLimited { attempts: 3 });
        assert_eq!(notice.title, "Rate Limited");
    }

    #[test]
    fn timeout_message_names_the_deadline() {
        let notice = Notice::for_error(&Error::Timeout { secs: 10 });
        assert_eq!(notice.title, "Response Timeout");
        assert!(notice.message.contains("10 seconds"));
    }

    #[test]
    fn missing_credential_maps_to_setup_required() {
        let notice = Notice::for_error(&Error::Config("no API key".into()));
        assert_eq!(notice.title, "Setup Required");
    }

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.notify(Notice::for_error(&Error::Permission));
        sink.notify(Notice::for_error(&Error::RateLimited { attempts: 3 }));

        let notices = sink.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].title, "Microphone Access");
        assert!(sink.has_title("Rate Limited"));
    }
}
