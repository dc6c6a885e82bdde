use crate::models::{NORMALIZED_MAX, NormalizedBox, PixelRect};

/// Map a normalized detector box onto an image and grow it by `expansion_factor`.
///
/// The box is first scaled linearly to pixel space, then padded by
/// `width * expansion_factor` horizontally and `height * expansion_factor`
/// vertically, half on each side, so the centre does not move. The result is
/// not clipped to the image; the renderer clips while drawing.
pub fn to_pixel_rect(
    bbox: &NormalizedBox,
    image_width: u32,
    image_height: u32,
    expansion_factor: f64,
) -> PixelRect {
    let w = image_width as f64;
    let h = image_height as f64;

    let mut left = bbox.xmin / NORMALIZED_MAX * w;
    let mut top = bbox.ymin / NORMALIZED_MAX * h;
    let mut width = (bbox.xmax - bbox.xmin) / NORMALIZED_MAX * w;
    let mut height = (bbox.ymax - bbox.ymin) / NORMALIZED_MAX * h;

    let pad_w = width * expansion_factor;
    let pad_h = height * expansion_factor;

    left -= pad_w / 2.0;
    top -= pad_h / 2.0;
    width += pad_w;
    height += pad_h;

    PixelRect::new(left, top, width, height)
}

/// Map every box in order.
pub fn to_pixel_rects(
    boxes: &[NormalizedBox],
    image_width: u32,
    image_height: u32,
    expansion_factor: f64,
) -> Vec<PixelRect> {
    boxes
        .iter()
        .map(|b| to_pixel_rect(b, image_width, image_height, expansion_factor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn scales_and_expands_face_box() {
        let bbox = NormalizedBox::new(100.0, 100.0, 300.0, 300.0);

        let plain = to_pixel_rect(&bbox, 1000, 1000, 0.0);
        assert_close(plain.left, 100.0);
        assert_close(plain.top, 100.0);
        assert_close(plain.width, 200.0);
        assert_close(plain.height, 200.0);

        let padded = to_pixel_rect(&bbox, 1000, 1000, 0.4);
        assert_close(padded.left, 60.0);
        assert_close(padded.top, 60.0);
        assert_close(padded.width, 280.0);
        assert_close(padded.height, 280.0);
    }

    #[test]
    fn zero_expansion_is_linear_scale() {
        let bbox = NormalizedBox::new(250.0, 100.0, 750.0, 400.0);
        let rect = to_pixel_rect(&bbox, 640, 480, 0.0);
        assert_close(rect.left, 64.0);
        assert_close(rect.top, 120.0);
        assert_close(rect.width, 192.0);
        assert_close(rect.height, 240.0);
    }

    #[test]
    fn expansion_keeps_center() {
        let boxes = [
            NormalizedBox::new(0.0, 0.0, 1000.0, 1000.0),
            NormalizedBox::new(12.5, 900.0, 80.0, 999.0),
            NormalizedBox::new(333.0, 444.0, 555.0, 666.0),
            NormalizedBox::new(500.0, 500.0, 500.0, 500.0),
        ];
        for bbox in &boxes {
            let base = to_pixel_rect(bbox, 1920, 1080, 0.0);
            for factor in [0.0, 0.4, 0.45, 0.55, 2.0] {
                let grown = to_pixel_rect(bbox, 1920, 1080, factor);
                let (bx, by) = base.center();
                let (gx, gy) = grown.center();
                assert_close(bx, gx);
                assert_close(by, gy);
                assert!(grown.width >= base.width);
                assert!(grown.height >= base.height);
            }
        }
    }

    #[test]
    fn edge_box_extends_past_image() {
        let bbox = NormalizedBox::new(0.0, 0.0, 100.0, 100.0);
        let rect = to_pixel_rect(&bbox, 200, 200, 0.5);
        assert!(rect.left < 0.0);
        assert!(rect.top < 0.0);
    }

    #[test]
    fn maps_in_order() {
        let boxes = vec![
            NormalizedBox::new(0.0, 0.0, 100.0, 100.0),
            NormalizedBox::new(500.0, 500.0, 600.0, 600.0),
        ];
        let rects = to_pixel_rects(&boxes, 100, 100, 0.0);
        assert_eq!(rects.len(), 2);
        assert_close(rects[0].left, 0.0);
        assert_close(rects[1].left, 50.0);
    }
}
