//! Audio capture and playback
//!
//! Capture produces a finished WAV artifact consumed by the transcription
//! client; playback renders decoded TTS output to the default speaker.

mod playback;
mod recorder;

pub use playback::AudioPlayback;
pub use recorder::{AudioArtifact, Recorder, SAMPLE_RATE, samples_to_wav};
