//! Error types for the conversation core.

use thiserror::Error;

use parley_clients::error::{ClientError, PortError};
use parley_core::types::JobStatus;

/// Errors raised while handling a conversation turn.
///
/// Capability failures are recovered at the dispatch boundary with an
/// apology turn; only `Port` errors and the exit intent end the run.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("image generation failed with status {status:?}: {message}")]
    GenerationFailed { status: JobStatus, message: String },

    #[error("image generation did not finish within {attempts} polls")]
    GenerationTimeout { attempts: u32 },

    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(#[from] ClientError),

    #[error("modality port error: {0}")]
    Port(#[from] PortError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
