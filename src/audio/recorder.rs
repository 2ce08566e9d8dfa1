//! Microphone capture and the recording session lifecycle

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Sample rate for recorded audio (WAV artifacts are 44.1kHz mono)
pub const SAMPLE_RATE: u32 = 44_100;

/// A finalized unit of recorded audio
///
/// Produced by ending a recording session, consumed exactly once by the
/// transcription client. The backing tempfile is removed when the artifact
/// is dropped.
pub struct AudioArtifact {
    file: NamedTempFile,
    wav: Vec<u8>,
}

impl AudioArtifact {
    /// Filesystem locator of the encoded audio
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Encoded WAV bytes
    #[must_use]
    pub fn wav_bytes(&self) -> &[u8] {
        &self.wav
    }
}

/// Manages microphone permission and the start/stop capture lifecycle
///
/// The cpal stream and sample buffer live only while a session is active
/// and are torn down on stop or error.
pub struct Recorder {
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    /// Create an idle recorder; no device is opened until [`Self::start`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        }
    }

    /// Check microphone availability
    ///
    /// Granted iff a default input device is present. On denial the caller
    /// must surface a notice and not proceed.
    #[must_use]
    pub fn request_permission() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    /// Whether a capture session is active
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Begin capturing audio
    ///
    /// Requires permission already granted and no active session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recording`] if a session is already active or the
    /// platform capture stream cannot be opened.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::Recording("session already active".to_string()));
        }

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(Error::Permission)?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Recording(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Recording("no suitable input config found".to_string()))?;

        let config: StreamConfig = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "opening capture stream"
        );

        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let buffer = Arc::clone(&self.buffer);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "capture stream error");
                },
                None,
            )
            .map_err(|e| Error::Recording(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::Recording(e.to_string()))?;
        self.stream = Some(stream);

        tracing::info!("recording started");
        Ok(())
    }

    /// Stop capturing and finalize the artifact
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recording`] if no session is active or no audio
    /// was captured.
    pub fn stop(&mut self) -> Result<AudioArtifact> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| Error::Recording("no active session".to_string()))?;
        drop(stream);

        let samples = self
            .buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        if samples.is_empty() {
            return Err(Error::Recording("no audio captured".to_string()));
        }

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;

        let mut file = tempfile::Builder::new()
            .prefix("parley-")
            .suffix(".wav")
            .tempfile()?;
        file.write_all(&wav)?;

        tracing::info!(
            samples = samples.len(),
            path = %file.path().display(),
            "recording stopped"
        );

        Ok(AudioArtifact { file, wav })
    }
}

/// Convert f32 samples to 16-bit mono WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_without_session_is_a_recording_error() {
        let mut recorder = Recorder::new();
        assert!(matches!(recorder.stop(), Err(Error::Recording(_))));
    }

    #[test]
    fn new_recorder_is_idle() {
        let recorder = Recorder::new();
        assert!(!recorder.is_recording());
    }
}
