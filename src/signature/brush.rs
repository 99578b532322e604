//! ラスタへの線描画（丸キャップのペン）

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::pointer::SurfacePoint;

/// Pen used for signatures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenStyle {
    pub width: f32,
    pub color: Rgba<u8>,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            width: 3.0,
            // #1f2937
            color: Rgba([0x1f, 0x29, 0x37, 0xff]),
        }
    }
}

pub const BACKGROUND: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

pub fn fill_background(canvas: &mut RgbaImage) {
    for pixel in canvas.pixels_mut() {
        *pixel = BACKGROUND;
    }
}

/// Round dab centred on `p`.
fn stamp(canvas: &mut RgbaImage, p: SurfacePoint, pen: &PenStyle) {
    let radius = ((pen.width - 1.0) / 2.0).round().max(0.0) as i32;
    let color = Rgba([pen.color[0], pen.color[1], pen.color[2], 255]);
    draw_filled_circle_mut(canvas, (p.x.round() as i32, p.y.round() as i32), radius, color);
}

/// Clip `from`-`to` to the rectangle `(min, max)` (Liang-Barsky).
/// `None` when the segment lies completely outside.
fn clip_segment(
    from: SurfacePoint,
    to: SurfacePoint,
    min: (f32, f32),
    max: (f32, f32),
) -> Option<(SurfacePoint, SurfacePoint)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    let edges = [
        (-dx, from.x - min.0),
        (dx, max.0 - from.x),
        (-dy, from.y - min.1),
        (dy, max.1 - from.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    let at = |t: f32| SurfacePoint::new(from.x + dx * t, from.y + dy * t);
    Some((at(t0), at(t1)))
}

/// Paint the segment `from`-`to` with round caps. Only the part within
/// reach of the canvas is stepped.
pub fn draw_segment(canvas: &mut RgbaImage, from: SurfacePoint, to: SurfacePoint, pen: &PenStyle) {
    let reach = pen.width + 1.0;
    let (w, h) = canvas.dimensions();
    let Some((from, to)) = clip_segment(from, to, (-reach, -reach), (w as f32 + reach, h as f32 + reach))
    else {
        return;
    };

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = (dx * dx + dy * dy).sqrt();
    let steps = (length / 0.5).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp(
            canvas,
            SurfacePoint::new(from.x + dx * t, from.y + dy * t),
            pen,
        );
    }
}

/// Count of pixels that differ from the background.
pub fn ink_pixels(canvas: &RgbaImage) -> usize {
    canvas.pixels().filter(|p| **p != BACKGROUND).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> RgbaImage {
        let mut canvas = RgbaImage::new(w, h);
        fill_background(&mut canvas);
        canvas
    }

    #[test]
    fn test_segment_paints_pixels_along_path() {
        let mut canvas = blank(40, 20);
        let pen = PenStyle::default();
        draw_segment(&mut canvas, SurfacePoint::new(5.0, 10.0), SurfacePoint::new(35.0, 10.0), &pen);
        assert_eq!(*canvas.get_pixel(20, 10), Rgba([0x1f, 0x29, 0x37, 0xff]));
        assert_eq!(*canvas.get_pixel(20, 2), BACKGROUND);
        assert!(ink_pixels(&canvas) > 30);
    }

    #[test]
    fn test_segment_outside_canvas_is_clipped() {
        let mut canvas = blank(10, 10);
        let pen = PenStyle::default();
        draw_segment(&mut canvas, SurfacePoint::new(-50.0, -50.0), SurfacePoint::new(-20.0, -20.0), &pen);
        assert_eq!(ink_pixels(&canvas), 0);
        draw_segment(&mut canvas, SurfacePoint::new(8.0, 8.0), SurfacePoint::new(40.0, 40.0), &pen);
        assert!(ink_pixels(&canvas) > 0);
    }

    #[test]
    fn test_far_away_endpoint_is_clipped_not_stepped() {
        let mut canvas = blank(40, 20);
        let pen = PenStyle::default();
        draw_segment(&mut canvas, SurfacePoint::new(5.0, 10.0), SurfacePoint::new(1.0e9, 10.0), &pen);
        assert_eq!(*canvas.get_pixel(30, 10), Rgba([0x1f, 0x29, 0x37, 0xff]));
        assert_eq!(*canvas.get_pixel(30, 2), BACKGROUND);

        // 方向は変わらない
        let mut canvas = blank(20, 20);
        draw_segment(&mut canvas, SurfacePoint::new(2.0, 2.0), SurfacePoint::new(2.0e6, 2.0e6), &pen);
        assert_ne!(*canvas.get_pixel(15, 15), BACKGROUND);
        assert_eq!(*canvas.get_pixel(15, 2), BACKGROUND);
    }

    #[test]
    fn test_clip_segment() {
        let clipped = clip_segment(
            SurfacePoint::new(-10.0, 5.0),
            SurfacePoint::new(30.0, 5.0),
            (0.0, 0.0),
            (20.0, 10.0),
        );
        assert_eq!(clipped, Some((SurfacePoint::new(0.0, 5.0), SurfacePoint::new(20.0, 5.0))));
        assert_eq!(
            clip_segment(SurfacePoint::new(-5.0, -5.0), SurfacePoint::new(-1.0, -1.0), (0.0, 0.0), (20.0, 10.0)),
            None
        );
    }

    #[test]
    fn test_fill_background_resets() {
        let mut canvas = blank(10, 10);
        draw_segment(&mut canvas, SurfacePoint::new(1.0, 1.0), SurfacePoint::new(8.0, 8.0), &PenStyle::default());
        fill_background(&mut canvas);
        assert_eq!(ink_pixels(&canvas), 0);
    }
}
