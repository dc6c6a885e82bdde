use std::path::{Path, PathBuf};

use crate::detection::{DetectionClient, parse_detection_response};
use crate::error::DetectionError;
use crate::models::NormalizedBox;

/// Detector that replays a saved classifier reply from disk.
///
/// The image payload is ignored; every call re-reads and re-parses the file,
/// so the file can be edited between runs.
#[derive(Debug, Clone)]
pub struct JsonFileDetector {
    path: PathBuf,
}

impl JsonFileDetector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DetectionClient for JsonFileDetector {
    async fn detect(&self, image_base64: &str) -> Result<Vec<NormalizedBox>, DetectionError> {
        tracing::debug!(
            path = %self.path.display(),
            payload_len = image_base64.len(),
            "replaying detector reply"
        );
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DetectionError::Service(format!("failed to read {:?}: {}", self.path, e))
        })?;
        parse_detection_response(&text)
    }
}
