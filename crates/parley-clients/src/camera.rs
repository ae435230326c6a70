//! File-backed camera source.
//!
//! Stands in for real camera hardware: each capture reads the newest frame
//! from a fixed path. Whatever drops frames there (a capture daemon, a
//! user-provided still) decides what the assistant "sees".

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ClientError;
use crate::FrameSource;

/// Reads one encoded frame from `path` per capture.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn capture_frame(&self) -> Result<Vec<u8>, ClientError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            ClientError::Capture(format!("cannot read frame from {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), size = bytes.len(), "Captured frame from file");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_frame_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let source = FileFrameSource::new(path);
        assert_eq!(source.capture_frame().await.unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_missing_frame_is_a_capture_error() {
        let source = FileFrameSource::new(PathBuf::from("/nonexistent/frame.jpg"));
        let err = source.capture_frame().await.unwrap_err();
        assert!(matches!(err, ClientError::Capture(_)));
        assert!(err.to_string().contains("/nonexistent/frame.jpg"));
    }
}
