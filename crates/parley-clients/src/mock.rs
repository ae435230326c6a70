//! Deterministic mock clients for testing the orchestration core.
//!
//! Each mock records its calls and returns configurable canned responses,
//! so tests can assert both the dispatch decisions and the payloads that
//! crossed the collaborator boundary.

use std::sync::Mutex;

use async_trait::async_trait;

use parley_core::types::{JobStatus, Turn};

use crate::error::ClientError;
use crate::{BlobStore, Caption, ChatCompletion, FrameSource, ImageGeneration, JobPoll, JobSubmission, SceneCaption};

// =============================================================================
// MockChatCompletion
// =============================================================================

/// One recorded chat-completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCall {
    pub system_profile: String,
    pub history: Vec<Turn>,
    pub utterance: String,
}

/// Mock chat-completion service returning a fixed reply.
#[derive(Debug, Default)]
pub struct MockChatCompletion {
    reply: String,
    fail: bool,
    calls: Mutex<Vec<CompletionCall>>,
}

impl MockChatCompletion {
    /// Create a mock that always answers with `reply`.
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl ChatCompletion for MockChatCompletion {
    async fn complete(
        &self,
        system_profile: &str,
        history: &[Turn],
        utterance: &str,
    ) -> Result<String, ClientError> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(CompletionCall {
                system_profile: system_profile.to_string(),
                history: history.to_vec(),
                utterance: utterance.to_string(),
            });
        if self.fail {
            return Err(ClientError::Completion("mock completion failure".to_string()));
        }
        Ok(self.reply.clone())
    }
}

// =============================================================================
// MockSceneCaption
// =============================================================================

/// Mock captioning service returning a fixed caption.
#[derive(Debug)]
pub struct MockSceneCaption {
    caption: Caption,
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockSceneCaption {
    /// Create a mock that always captions with `text`.
    pub fn with_caption(text: &str) -> Self {
        Self {
            caption: Caption {
                text: text.to_string(),
                confidence: 0.9,
            },
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            caption: Caption {
                text: String::new(),
                confidence: 0.0,
            },
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All `(image_url, language)` pairs captioned so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl SceneCaption for MockSceneCaption {
    async fn caption(&self, image_url: &str, language: &str) -> Result<Caption, ClientError> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push((image_url.to_string(), language.to_string()));
        if self.fail {
            return Err(ClientError::Caption("mock caption failure".to_string()));
        }
        Ok(self.caption.clone())
    }
}

// =============================================================================
// MockImageGeneration
// =============================================================================

/// Mock image-generation service with a scripted poll sequence.
///
/// `submit` always returns the configured handle and retry-after value;
/// each `poll` pops the next scripted response.
#[derive(Debug)]
pub struct MockImageGeneration {
    operation_location: String,
    retry_after_secs: u64,
    polls: Mutex<Vec<JobPoll>>,
    image_bytes: Vec<u8>,
    submitted: Mutex<Vec<String>>,
    poll_count: Mutex<usize>,
}

impl MockImageGeneration {
    /// Create a mock with the given pacing and scripted poll responses.
    pub fn with_polls(retry_after_secs: u64, polls: Vec<JobPoll>) -> Self {
        Self {
            operation_location: "mock://operations/1".to_string(),
            retry_after_secs,
            polls: Mutex::new(polls),
            image_bytes: b"mock image bytes".to_vec(),
            submitted: Mutex::new(Vec::new()),
            poll_count: Mutex::new(0),
        }
    }

    /// Convenience: `pending_polls` non-terminal responses, then success.
    pub fn succeeding_after(retry_after_secs: u64, pending_polls: usize) -> Self {
        let mut polls = vec![
            JobPoll {
                status: JobStatus::Pending,
                result_url: None,
                message: None,
            };
            pending_polls
        ];
        polls.push(JobPoll {
            status: JobStatus::Succeeded,
            result_url: Some("mock://results/image.jpg".to_string()),
            message: None,
        });
        Self::with_polls(retry_after_secs, polls)
    }

    /// Convenience: the first poll reports failure with `message`.
    pub fn failing_with(retry_after_secs: u64, message: &str) -> Self {
        Self::with_polls(
            retry_after_secs,
            vec![JobPoll {
                status: JobStatus::Failed,
                result_url: None,
                message: Some(message.to_string()),
            }],
        )
    }

    /// Prompts submitted so far.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().expect("mock lock poisoned").clone()
    }

    /// Number of polls performed so far.
    pub fn poll_count(&self) -> usize {
        *self.poll_count.lock().expect("mock lock poisoned")
    }
}

#[async_trait]
impl ImageGeneration for MockImageGeneration {
    async fn submit(&self, prompt: &str) -> Result<JobSubmission, ClientError> {
        self.submitted
            .lock()
            .expect("mock lock poisoned")
            .push(prompt.to_string());
        Ok(JobSubmission {
            operation_location: self.operation_location.clone(),
            retry_after_secs: self.retry_after_secs,
        })
    }

    async fn poll(&self, _operation_location: &str) -> Result<JobPoll, ClientError> {
        let mut count = self.poll_count.lock().expect("mock lock poisoned");
        let mut polls = self.polls.lock().expect("mock lock poisoned");
        if polls.is_empty() {
            return Err(ClientError::Generation("poll script exhausted".to_string()));
        }
        *count += 1;
        Ok(polls.remove(0))
    }

    async fn download(&self, _url: &str) -> Result<Vec<u8>, ClientError> {
        Ok(self.image_bytes.clone())
    }
}

// =============================================================================
// MockBlobStore
// =============================================================================

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MockBlobStore {
    blobs: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(container, name)` pairs uploaded so far.
    pub fn uploaded(&self) -> Vec<(String, String)> {
        self.blobs
            .lock()
            .expect("mock lock poisoned")
            .iter()
            .map(|(c, n, _)| (c.clone(), n.clone()))
            .collect()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn upload(
        &self,
        container: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<String, ClientError> {
        self.blobs.lock().expect("mock lock poisoned").push((
            container.to_string(),
            name.to_string(),
            bytes.to_vec(),
        ));
        Ok(format!("mock://{container}/{name}"))
    }

    async fn download(&self, container: &str, name: &str) -> Result<Vec<u8>, ClientError> {
        self.blobs
            .lock()
            .expect("mock lock poisoned")
            .iter()
            .find(|(c, n, _)| c == container && n == name)
            .map(|(_, _, bytes)| bytes.clone())
            .ok_or_else(|| ClientError::Blob(format!("blob not found: {container}/{name}")))
    }
}

// =============================================================================
// MockFrameSource
// =============================================================================

/// Mock camera returning a fixed encoded frame.
#[derive(Debug)]
pub struct MockFrameSource {
    frame: Vec<u8>,
    fail: bool,
}

impl MockFrameSource {
    pub fn new() -> Self {
        Self {
            frame: b"mock jpeg frame".to_vec(),
            fail: false,
        }
    }

    /// Create a mock whose every capture fails, as a missing camera would.
    pub fn failing() -> Self {
        Self {
            frame: Vec::new(),
            fail: true,
        }
    }
}

impl Default for MockFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSource for MockFrameSource {
    async fn capture_frame(&self) -> Result<Vec<u8>, ClientError> {
        if self.fail {
            return Err(ClientError::Capture("mock camera unavailable".to_string()));
        }
        Ok(self.frame.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
