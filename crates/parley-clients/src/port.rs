//! Modality port: one interface over the typed and spoken channels.
//!
//! The shell owns the concrete port (console, speech); the orchestrator only
//! sees this trait. Reading blocks until the user produces an utterance.

use std::collections::VecDeque;

use crate::error::PortError;

/// Bidirectional channel between the user and the orchestrator.
pub trait ModalityPort: Send {
    /// Block until the user produces one utterance.
    fn read_utterance(&mut self) -> Result<String, PortError>;

    /// Emit a response on the port's output channel.
    fn emit(&mut self, text: &str) -> Result<(), PortError>;
}

/// Scripted port for tests.
///
/// Returns queued utterances in order and records everything emitted.
/// Reading past the end of the script is a read failure, so tests must end
/// their scripts with an exit word.
#[derive(Debug, Default)]
pub struct MockPort {
    script: VecDeque<String>,
    emitted: Vec<String>,
}

impl MockPort {
    /// Create a port that will produce the given utterances in order.
    pub fn with_script<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: script.into_iter().map(Into::into).collect(),
            emitted: Vec::new(),
        }
    }

    /// Everything emitted so far, in order.
    pub fn emitted(&self) -> &[String] {
        &self.emitted
    }
}

impl ModalityPort for MockPort {
    fn read_utterance(&mut self) -> Result<String, PortError> {
        self.script
            .pop_front()
            .ok_or_else(|| PortError::Read("script exhausted".to_string()))
    }

    fn emit(&mut self, text: &str) -> Result<(), PortError> {
        self.emitted.push(text.to_string());
        Ok(())
    }
}
