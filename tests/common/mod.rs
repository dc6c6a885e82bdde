#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from facecensor for tests
pub use facecensor::{
    Completion, DetectionClient, DetectionError, JsonFileDetector, NormalizedBox, Phase,
    PipelineController, RedactConfig, RedactError,
};
