//! Error types for the capability clients and the modality port.

use thiserror::Error;

/// Errors from the remote capability services.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("completion error: {0}")]
    Completion(String),

    #[error("caption error: {0}")]
    Caption(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("blob error: {0}")]
    Blob(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from the modality port.
///
/// `Unavailable` at startup is fatal: the session never begins without a
/// working input channel.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("modality unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read utterance: {0}")]
    Read(String),

    #[error("failed to emit response: {0}")]
    Emit(String),
}
