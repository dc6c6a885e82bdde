use thiserror::Error;

use crate::pipeline::Phase;

/// Failure reported by a [`crate::detection::DetectionClient`].
#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    #[error("detection service unreachable: {0}")]
    Network(String),

    #[error("detection service error: {0}")]
    Service(String),

    #[error("no response from detector")]
    EmptyResponse,

    #[error("malformed detector response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("expansion factor must be a finite value >= 0, got {0}")]
    InvalidExpansionFactor(f64),

    #[error("export prefix must not be empty")]
    EmptyExportPrefix,
}

#[derive(Debug, Error)]
pub enum RedactError {
    #[error("failed to ingest image: {0}")]
    Ingestion(String),

    #[error("detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("failed to render masks: {0}")]
    Render(String),

    #[error("failed to export image: {0}")]
    Export(String),

    #[error("cannot {action} while {phase}")]
    Rejected { action: &'static str, phase: Phase },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
