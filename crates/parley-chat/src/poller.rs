//! Long-running image-generation jobs: submit, poll, download.
//!
//! The generation service answers a submission with an operation handle and
//! a pacing value. The poller sleeps that long before every poll; the
//! submission's pacing is used for the whole loop, matching the service's
//! documented contract (the value is not refreshed from later responses).
//! The upstream protocol has no timeout of its own, so the poller caps the
//! number of attempts.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, trace};

use parley_clients::ImageGeneration;
use parley_core::types::{GenerationJob, JobStatus};

use crate::error::{ChatError, Result};

/// A finished generation: where it came from, its bytes, and where (if
/// anywhere) it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub url: String,
    pub bytes: Vec<u8>,
    pub path: Option<PathBuf>,
}

/// Drives one image-generation job from submission to a terminal status.
#[derive(Debug, Clone)]
pub struct JobPoller {
    max_attempts: u32,
    output_path: Option<PathBuf>,
}

impl JobPoller {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            output_path: None,
        }
    }

    /// Also persist the downloaded image to `path`.
    pub fn with_output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }

    /// Submit `prompt` and poll until the job reaches a terminal status.
    ///
    /// `Failed` carries the service-reported reason; exceeding the attempt
    /// cap is a [`ChatError::GenerationTimeout`].
    pub async fn run(
        &self,
        service: &dyn ImageGeneration,
        prompt: &str,
    ) -> Result<GeneratedImage> {
        let submission = service.submit(prompt).await?;
        let mut job = GenerationJob::submitted(
            submission.operation_location,
            submission.retry_after_secs,
        );
        debug!(
            operation = %job.operation_location,
            interval_secs = job.poll_interval_secs,
            "Image generation submitted"
        );

        let interval = Duration::from_secs(job.poll_interval_secs);
        for attempt in 1..=self.max_attempts {
            sleep(interval).await;
            let poll = service.poll(&job.operation_location).await?;
            job.status = poll.status.clone();
            job.result_url = poll.result_url;

            match job.status {
                JobStatus::Succeeded => {
                    let url = job.result_url.ok_or_else(|| ChatError::GenerationFailed {
                        status: JobStatus::Succeeded,
                        message: "service reported success without a result URL".to_string(),
                    })?;
                    let bytes = service.download(&url).await?;
                    let path = match &self.output_path {
                        Some(path) => {
                            std::fs::write(path, &bytes)?;
                            info!(path = %path.display(), size = bytes.len(), "Generated image saved");
                            Some(path.clone())
                        }
                        None => None,
                    };
                    return Ok(GeneratedImage { url, bytes, path });
                }
                JobStatus::Failed => {
                    return Err(ChatError::GenerationFailed {
                        status: JobStatus::Failed,
                        message: poll
                            .message
                            .unwrap_or_else(|| "no reason reported".to_string()),
                    });
                }
                JobStatus::Pending | JobStatus::Running => {
                    trace!(attempt, status = ?job.status, "Generation still in flight");
                }
            }
        }

        Err(ChatError::GenerationTimeout {
            attempts: self.max_attempts,
        })
    }
}
