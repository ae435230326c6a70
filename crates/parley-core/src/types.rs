use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation turns
// =============================================================================

/// The author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion services.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation. Immutable once appended to history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a user turn stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant turn stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Intents
// =============================================================================

/// Classified purpose of a user utterance. Derived per turn, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Zero-length utterance; short-circuits before any service call.
    Empty,
    /// Session-control command that ends the conversation loop.
    Exit,
    /// Session-control command that clears the dialogue history.
    Restart,
    /// Kick off a long-running image-generation job.
    GenerateImage,
    /// Capture a camera frame and fold its caption into the question.
    DescribeScene,
    /// Plain chat-completion question.
    Query,
}

// =============================================================================
// Generation jobs
// =============================================================================

/// Status of a long-running image-generation operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Parse a service-reported status string.
    ///
    /// Unknown statuses map to `Failed`: the generation protocol treats any
    /// status that is neither in-flight nor `Succeeded` as an error state.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" | "notstarted" | "notrunning" | "queued" => JobStatus::Pending,
            "running" | "inprogress" => JobStatus::Running,
            "succeeded" => JobStatus::Succeeded,
            _ => JobStatus::Failed,
        }
    }

    /// Whether no further polling should occur for this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// State of one outstanding image-generation request.
///
/// Lives only for the duration of a single polling loop; never persisted
/// across turns.
#[derive(Clone, Debug)]
pub struct GenerationJob {
    /// Opaque operation handle returned by the submission call.
    pub operation_location: String,
    pub status: JobStatus,
    /// Server-dictated pacing, taken from the submission response.
    pub poll_interval_secs: u64,
    pub result_url: Option<String>,
}

impl GenerationJob {
    /// Create a job in the `Pending` state from a submission response.
    pub fn submitted(operation_location: impl Into<String>, poll_interval_secs: u64) -> Self {
        Self {
            operation_location: operation_location.into(),
            status: JobStatus::Pending,
            poll_interval_secs,
            result_url: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
