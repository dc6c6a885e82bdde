pub mod replay;
pub mod response;

use std::future::Future;

use crate::error::DetectionError;
use crate::models::NormalizedBox;

pub use replay::JsonFileDetector;
pub use response::parse_detection_response;

/// Instruction a networked client sends to the vision classifier alongside
/// the image. The reply it asks for is what [`parse_detection_response`]
/// accepts.
pub const DETECTION_PROMPT: &str = "Detect every face in this image. Return their bounding boxes \
in a normalized [ymin, xmin, ymax, xmax] format (values from 0 to 1000). Focus specifically on \
the head and facial area. Only return valid JSON.";

/// MIME type a networked client declares for the base64 image payload.
/// The payload is the source file as read, whatever its actual format.
pub const PAYLOAD_MIME_TYPE: &str = "image/jpeg";

/// External face detector.
///
/// Receives the source file bytes as standard base64 and answers with boxes
/// in detector order. Any transport or schema problem must be reported as an
/// error, never as an empty list; an empty list means "no faces".
pub trait DetectionClient {
    fn detect(
        &self,
        image_base64: &str,
    ) -> impl Future<Output = Result<Vec<NormalizedBox>, DetectionError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_requests_the_parsed_box_layout() {
        assert!(DETECTION_PROMPT.contains("[ymin, xmin, ymax, xmax]"));
        assert!(DETECTION_PROMPT.contains("0 to 1000"));
        assert!(DETECTION_PROMPT.contains("JSON"));
    }

    #[test]
    fn payload_is_declared_as_jpeg() {
        assert_eq!(PAYLOAD_MIME_TYPE, "image/jpeg");
    }
}
