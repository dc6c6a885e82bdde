use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;

/// Upper bound of the normalized coordinate space (1000 = 100% of a dimension).
pub const NORMALIZED_MAX: f64 = 1000.0;

/// Region reported by the detector, in 0..=1000 fractions of the image size.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBox {
    pub ymin: f64,
    pub xmin: f64,
    pub ymax: f64,
    pub xmax: f64,

    /// Detector label. Carried along, never used when drawing.
    pub label: Option<String>,
}

impl NormalizedBox {
    pub fn new(ymin: f64, xmin: f64, ymax: f64, xmax: f64) -> Self {
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check range and ordering. Returns the reason the box is unusable.
    pub fn validate(&self) -> Result<(), String> {
        let coords = [
            ("ymin", self.ymin),
            ("xmin", self.xmin),
            ("ymax", self.ymax),
            ("xmax", self.xmax),
        ];
        for (name, value) in coords {
            if !value.is_finite() || !(0.0..=NORMALIZED_MAX).contains(&value) {
                return Err(format!("{} = {} is outside [0, {}]", name, value, NORMALIZED_MAX));
            }
        }
        if self.ymin > self.ymax {
            return Err(format!("ymin {} > ymax {}", self.ymin, self.ymax));
        }
        if self.xmin > self.xmax {
            return Err(format!("xmin {} > xmax {}", self.xmin, self.xmax));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Rectangle in pixel units of a specific image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Same rect with negative extents collapsed to zero.
    pub fn clamped(&self) -> Self {
        Self {
            left: self.left,
            top: self.top,
            width: self.width.max(0.0),
            height: self.height.max(0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Ordered detector output. Order follows the detector's reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSet {
    boxes: Vec<NormalizedBox>,
}

impl DetectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every well-formed box, dropping malformed ones with a warning.
    ///
    /// Returns the set together with the number of dropped boxes. A single
    /// bad box never invalidates the rest of the reply.
    pub fn from_detector(raw: Vec<NormalizedBox>) -> (Self, usize) {
        let total = raw.len();
        let boxes: Vec<NormalizedBox> = raw
            .into_iter()
            .enumerate()
            .filter_map(|(idx, b)| match b.validate() {
                Ok(()) => Some(b),
                Err(reason) => {
                    tracing::warn!(index = idx, %reason, "dropping malformed detection box");
                    None
                }
            })
            .collect();
        let dropped = total - boxes.len();
        (Self { boxes }, dropped)
    }

    pub fn boxes(&self) -> &[NormalizedBox] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Decoded input image together with the bytes it was decoded from
#[derive(Clone)]
pub struct SourceImage {
    pub name: String,
    pub image: DynamicImage,
    encoded: Vec<u8>,
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("name", &self.name)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("encoded_len", &self.encoded.len())
            .finish()
    }
}

impl SourceImage {
    /// Decode raw file bytes in any format the `image` crate understands.
    pub fn decode(name: impl Into<String>, bytes: Vec<u8>) -> anyhow::Result<Self> {
        let image = image::load_from_memory(&bytes)
            .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
        Ok(Self {
            name: name.into(),
            image,
            encoded: bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Original file bytes as standard base64, as sent to the detector.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.encoded)
    }
}
