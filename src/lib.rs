pub mod config;
pub mod detection;
pub mod error;
pub mod export;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod render;

pub use config::RedactConfig;
pub use detection::{DetectionClient, JsonFileDetector};
pub use error::{ConfigError, DetectionError, RedactError};
pub use export::{ExportArtifact, ExportService};
pub use models::{DetectionSet, NormalizedBox, PixelRect, SourceImage};
pub use pipeline::{
    Completion, DetectionRequest, Phase, PipelineController, PipelineSession, SessionStatus,
};
pub use render::{MaskRenderer, RenderedSurface};
