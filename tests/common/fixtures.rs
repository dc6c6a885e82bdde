use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use facecensor::{DetectionClient, DetectionError, NormalizedBox};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};

/// Encodes a width x height RGB gradient in the given format.
pub fn gradient_image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 200u8])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode test image");
    bytes
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    gradient_image_bytes(width, height, ImageFormat::Png)
}

/// The face box used throughout the scenarios: 20% of the image, top-left quadrant.
pub fn face_box() -> NormalizedBox {
    NormalizedBox::new(100.0, 100.0, 300.0, 300.0).with_label("face")
}

/// Detector that answers with pre-recorded replies, one per call.
pub struct ScriptedDetector {
    replies: Mutex<VecDeque<Result<Vec<NormalizedBox>, DetectionError>>>,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(replies: Vec<Result<Vec<NormalizedBox>, DetectionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DetectionClient for ScriptedDetector {
    async fn detect(&self, image_base64: &str) -> Result<Vec<NormalizedBox>, DetectionError> {
        assert!(!image_base64.is_empty(), "detector received an empty payload");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DetectionError::Service("no scripted reply left".to_string())))
    }
}
