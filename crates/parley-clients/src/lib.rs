//! Capability clients for the Parley assistant.
//!
//! Defines the traits the orchestration core talks to — chat completion,
//! scene captioning, long-running image generation, blob storage, camera
//! frames, and the modality port — together with deterministic mocks for
//! tests and thin REST implementations over the vendor HTTP surfaces.
//!
//! Retries and availability are each service's own concern; every trait
//! method is a single request/response call.

pub mod camera;
pub mod error;
pub mod mock;
pub mod port;
pub mod rest;

use async_trait::async_trait;

use parley_core::types::{JobStatus, Turn};

use crate::error::ClientError;

pub use camera::FileFrameSource;
pub use error::{ClientError as Error, PortError};
pub use mock::{
    MockBlobStore, MockChatCompletion, MockFrameSource, MockImageGeneration, MockSceneCaption,
};
pub use port::{MockPort, ModalityPort};
pub use rest::{RestBlobStore, RestChatCompletion, RestImageGeneration, RestSceneCaption};

// =============================================================================
// DTOs
// =============================================================================

/// Caption produced by the scene-analysis service.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub confidence: f64,
}

/// Response to an image-generation submission.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSubmission {
    /// Opaque operation handle to poll for completion.
    pub operation_location: String,
    /// Server-dictated pacing from the `Retry-After` header.
    pub retry_after_secs: u64,
}

/// One poll of an outstanding image-generation operation.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPoll {
    pub status: JobStatus,
    /// Present once the status is `Succeeded`.
    pub result_url: Option<String>,
    /// Service-reported reason on error statuses.
    pub message: Option<String>,
}

// =============================================================================
// Capability traits
// =============================================================================

/// Chat-completion service.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Generate an assistant reply for `utterance` given the system profile
    /// and the prior conversation history (oldest turn first).
    async fn complete(
        &self,
        system_profile: &str,
        history: &[Turn],
        utterance: &str,
    ) -> Result<String, ClientError>;
}

/// Scene-captioning service over a remotely reachable image URL.
#[async_trait]
pub trait SceneCaption: Send + Sync {
    async fn caption(&self, image_url: &str, language: &str) -> Result<Caption, ClientError>;
}

/// Long-running image-generation service.
#[async_trait]
pub trait ImageGeneration: Send + Sync {
    /// Submit a generation request; returns the operation handle and the
    /// initial pacing value.
    async fn submit(&self, prompt: &str) -> Result<JobSubmission, ClientError>;

    /// Poll an outstanding operation for its current status.
    async fn poll(&self, operation_location: &str) -> Result<JobPoll, ClientError>;

    /// Fetch the finished image bytes from the result URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError>;
}

/// Blob store for snapshot upload and retrieval.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes; returns the remotely reachable URL of the blob.
    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<String, ClientError>;

    /// Download a blob's bytes.
    async fn download(&self, container: &str, name: &str) -> Result<Vec<u8>, ClientError>;
}

/// Camera collaborator producing one encoded frame per call.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture_frame(&self) -> Result<Vec<u8>, ClientError>;
}

// =============================================================================
// Shared-handle passthroughs
// =============================================================================
// A shared client behaves as the client itself, so callers can keep a handle
// to a boxed collaborator (tests assert against mock call records this way).

#[async_trait]
impl<T: ChatCompletion + ?Sized> ChatCompletion for std::sync::Arc<T> {
    async fn complete(
        &self,
        system_profile: &str,
        history: &[Turn],
        utterance: &str,
    ) -> Result<String, ClientError> {
        (**self).complete(system_profile, history, utterance).await
    }
}

#[async_trait]
impl<T: SceneCaption + ?Sized> SceneCaption for std::sync::Arc<T> {
    async fn caption(&self, image_url: &str, language: &str) -> Result<Caption, ClientError> {
        (**self).caption(image_url, language).await
    }
}

#[async_trait]
impl<T: ImageGeneration + ?Sized> ImageGeneration for std::sync::Arc<T> {
    async fn submit(&self, prompt: &str) -> Result<JobSubmission, ClientError> {
        (**self).submit(prompt).await
    }

    async fn poll(&self, operation_location: &str) -> Result<JobPoll, ClientError> {
        (**self).poll(operation_location).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        (**self).download(url).await
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<String, ClientError> {
        (**self).upload(container, name, bytes).await
    }

    async fn download(&self, container: &str, name: &str) -> Result<Vec<u8>, ClientError> {
        (**self).download(container, name).await
    }
}

#[async_trait]
impl<T: FrameSource + ?Sized> FrameSource for std::sync::Arc<T> {
    async fn capture_frame(&self) -> Result<Vec<u8>, ClientError> {
        (**self).capture_frame().await
    }
}
