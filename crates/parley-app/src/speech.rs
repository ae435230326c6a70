//! Spoken modality port stub.
//!
//! Provides a placeholder for the speech channel. Actual microphone capture
//! and voice synthesis need a platform audio backend; until one is wired in,
//! reading reports the channel unavailable and emission falls back to stdout.

use tracing::debug;

use parley_clients::error::PortError;
use parley_clients::ModalityPort;
use parley_core::config::SpeechConfig;

/// Stub spoken port carrying the configured recognition/synthesis settings.
pub struct SpeechPort {
    /// BCP-47 tag for speech recognition.
    pub recognition_language: String,
    /// Synthesis voice name.
    pub synthesis_voice: String,
}

impl SpeechPort {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            recognition_language: config.recognition_language.clone(),
            synthesis_voice: config.synthesis_voice.clone(),
        }
    }

    /// Check whether a speech backend is available on this build.
    pub fn is_available(&self) -> bool {
        false
    }
}

impl ModalityPort for SpeechPort {
    fn read_utterance(&mut self) -> Result<String, PortError> {
        Err(PortError::Unavailable(format!(
            "speech recognition ({}) has no audio backend on this build",
            self.recognition_language
        )))
    }

    fn emit(&mut self, text: &str) -> Result<(), PortError> {
        // Stub: no synthesis happens; print so the response is not lost.
        debug!(voice = %self.synthesis_voice, "No synthesis backend; printing response");
        println!("{text}");
        Ok(())
    }
}
