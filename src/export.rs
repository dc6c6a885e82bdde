use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use image::ImageFormat;
use time::OffsetDateTime;

use crate::error::RedactError;
use crate::render::RenderedSurface;

pub const EXPORT_EXTENSION: &str = "png";

/// Encoded redacted image plus the filename it should be saved under
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub suggested_name: String,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its suggested name.
    /// An existing file with the same name is overwritten.
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, RedactError> {
        let dir = dir.as_ref();
        let path = dir.join(&self.suggested_name);
        write_file(dir, &path, &self.bytes)
            .await
            .map_err(|e| RedactError::Export(format!("{:#}", e)))?;

        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "exported redacted image");
        Ok(path)
    }
}

async fn write_file(dir: &Path, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

/// PNG serializer with timestamp-based filenames.
///
/// Tokens are Unix milliseconds, bumped by one when two exports land in the
/// same millisecond, so names from one service never repeat.
#[derive(Debug)]
pub struct ExportService {
    prefix: String,
    last_token: AtomicU64,
}

impl ExportService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_token: AtomicU64::new(0),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn serialize(&self, surface: &RenderedSurface) -> Result<ExportArtifact, RedactError> {
        let mut bytes = Vec::new();
        surface
            .pixels()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RedactError::Export(format!("PNG encoding failed: {}", e)))?;

        let suggested_name = format!("{}-{}.{}", self.prefix, self.next_token(), EXPORT_EXTENSION);
        tracing::debug!(name = %suggested_name, bytes = bytes.len(), "serialized surface");

        Ok(ExportArtifact {
            bytes,
            suggested_name,
        })
    }

    fn next_token(&self) -> u64 {
        let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64;
        let mut token = now;
        // fetch_update only fails if the closure returns None
        let _ = self
            .last_token
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                token = now.max(last + 1);
                Some(token)
            });
        token
    }
}
