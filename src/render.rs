use image::{DynamicImage, Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::error::RedactError;
use crate::models::{PixelRect, SourceImage};

/// Opaque black used for the masks.
pub const MASK_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// White at 30% alpha, drawn on the inner edge of the mask boundary.
pub const MASK_OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 77]);

/// Surface width that gets one extra pixel of outline.
pub const OUTLINE_SCALE_WIDTH: u32 = 1200;

/// Outline thickness for a surface `width` pixels wide, at least 1.
pub fn outline_width(width: u32) -> u32 {
    (width / OUTLINE_SCALE_WIDTH).max(1)
}

/// Redacted raster produced by [`MaskRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSurface {
    pixels: RgbaImage,
}

impl RenderedSurface {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

/// Pixel bounds of a rect, snapped outward so partial pixels are covered.
/// `x1`/`y1` are exclusive. Not clipped to any surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SnappedRect {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl SnappedRect {
    fn from_pixel_rect(rect: &PixelRect) -> Option<Self> {
        let rect = rect.clamped();
        if rect.is_empty() || !rect.left.is_finite() || !rect.top.is_finite() {
            return None;
        }
        let snapped = Self {
            x0: rect.left.floor() as i64,
            y0: rect.top.floor() as i64,
            x1: rect.right().ceil() as i64,
            y1: rect.bottom().ceil() as i64,
        };
        (snapped.x1 > snapped.x0 && snapped.y1 > snapped.y0).then_some(snapped)
    }

    fn clip(&self, width: u32, height: u32) -> Option<Rect> {
        let x0 = self.x0.clamp(0, width as i64);
        let y0 = self.y0.clamp(0, height as i64);
        let x1 = self.x1.clamp(0, width as i64);
        let y1 = self.y1.clamp(0, height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::at(x0 as i32, y0 as i32).of_size((x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Composites opaque masks over an untouched copy of the source.
#[derive(Debug, Clone)]
pub struct MaskRenderer {
    pub fill: Rgba<u8>,

    /// Cosmetic edge drawn inside the mask boundary. `None` disables it.
    pub outline: Option<Rgba<u8>>,
}

impl MaskRenderer {
    pub fn new() -> Self {
        Self {
            fill: MASK_FILL,
            outline: Some(MASK_OUTLINE),
        }
    }

    pub fn without_outline(mut self) -> Self {
        self.outline = None;
        self
    }

    pub fn render(
        &self,
        source: &SourceImage,
        rects: &[PixelRect],
    ) -> Result<RenderedSurface, RedactError> {
        self.render_image(&source.image, rects)
    }

    /// Draw `image` at the origin, then a filled mask for every rect in order.
    pub fn render_image(
        &self,
        image: &DynamicImage,
        rects: &[PixelRect],
    ) -> Result<RenderedSurface, RedactError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(RedactError::Render(format!(
                "unsupported surface size {}x{}",
                width, height
            )));
        }

        let mut surface = RgbaImage::new(width, height);
        image::imageops::replace(&mut surface, &image.to_rgba8(), 0, 0);

        let stroke = outline_width(width);
        let mut drawn = 0usize;
        for rect in rects {
            let Some(snapped) = SnappedRect::from_pixel_rect(rect) else {
                continue;
            };
            let Some(visible) = snapped.clip(width, height) else {
                continue;
            };
            draw_filled_rect_mut(&mut surface, visible, self.fill);
            if let Some(outline) = self.outline {
                stroke_rect(&mut surface, &snapped, outline, stroke);
            }
            drawn += 1;
        }

        tracing::debug!(
            width,
            height,
            requested = rects.len(),
            drawn,
            "rendered redaction masks"
        );

        Ok(RenderedSurface { pixels: surface })
    }
}

impl Default for MaskRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Blend `stroke` concentric 1px rings onto the outermost pixels of `rect`,
/// skipping what falls outside the surface. Rings never leave the rect and
/// each pixel is blended once.
fn stroke_rect(surface: &mut RgbaImage, rect: &SnappedRect, color: Rgba<u8>, stroke: u32) {
    for inset in 0..stroke as i64 {
        let ring = SnappedRect {
            x0: rect.x0 + inset,
            y0: rect.y0 + inset,
            x1: rect.x1 - inset,
            y1: rect.y1 - inset,
        };
        if ring.x1 <= ring.x0 || ring.y1 <= ring.y0 {
            break;
        }
        stroke_ring(surface, &ring, color);
    }
}

fn stroke_ring(surface: &mut RgbaImage, rect: &SnappedRect, color: Rgba<u8>) {
    let (width, height) = (surface.width() as i64, surface.height() as i64);
    let (left, top) = (rect.x0, rect.y0);
    let (right, bottom) = (rect.x1 - 1, rect.y1 - 1);

    let mut blend_at = |x: i64, y: i64| {
        if (0..width).contains(&x) && (0..height).contains(&y) {
            surface.get_pixel_mut(x as u32, y as u32).blend(&color);
        }
    };

    let span_x0 = left.max(0);
    let span_x1 = right.min(width - 1);
    for x in span_x0..=span_x1 {
        blend_at(x, top);
        if bottom != top {
            blend_at(x, bottom);
        }
    }

    let span_y0 = (top + 1).max(0);
    let span_y1 = (bottom - 1).min(height - 1);
    for y in span_y0..=span_y1 {
        blend_at(left, y);
        if right != left {
            blend_at(right, y);
        }
    }
}
