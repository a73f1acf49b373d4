//! Pixel-level compositing on an RGBA buffer.
//!
//! Coverage is binary: a pixel is either inside a shape (tested at its center)
//! or not. Hard edges keep the exact-color match of the fill tool predictable.

use egui::Pos2;
use image::{Rgba, RgbaImage};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How paint is combined with the pixels already on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Normal alpha blending of the brush color over the destination
    #[default]
    PaintOver,
    /// Drive the destination alpha toward zero, ignoring the brush color
    Erase,
}

/// Straight-alpha source-over blend. `coverage` scales the source alpha.
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let src_a = src[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    if src_a >= 1.0 {
        *dst = src;
        return;
    }

    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *dst = TRANSPARENT;
        return;
    }
    let blend = |s: u8, d: u8| {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        ((s * src_a + d * dst_a * (1.0 - src_a)) / out_a * 255.0)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}

/// Destination-out: removes `strength` of the destination's opacity.
pub fn erase(dst: &mut Rgba<u8>, strength: f32) {
    let keep = 1.0 - strength.clamp(0.0, 1.0);
    let alpha = (dst[3] as f32 * keep).round() as u8;
    if alpha == 0 {
        *dst = TRANSPARENT;
    } else {
        dst[3] = alpha;
    }
}

pub fn composite(dst: &mut Rgba<u8>, src: Rgba<u8>, mode: CompositeMode, coverage: f32) {
    match mode {
        CompositeMode::PaintOver => blend_over(dst, src, coverage),
        CompositeMode::Erase => erase(dst, coverage),
    }
}

/// Pixel range `[min_x, max_x) x [min_y, max_y)` of a float box, clipped to the image.
fn clipped_range(img: &RgbaImage, min: Pos2, max: Pos2) -> Option<(u32, u32, u32, u32)> {
    let width = img.width() as f32;
    let height = img.height() as f32;
    let min_x = min.x.floor().max(0.0);
    let min_y = min.y.floor().max(0.0);
    let max_x = max.x.ceil().min(width);
    let max_y = max.y.ceil().min(height);
    if min_x >= max_x || min_y >= max_y {
        return None;
    }
    Some((min_x as u32, min_y as u32, max_x as u32, max_y as u32))
}

/// Composites `color` into every pixel of the box whose center satisfies `covers`.
///
/// Each pixel is touched at most once, so overlapping parts of one shape
/// (rectangle corners, segment ends) never double-blend.
pub fn paint_coverage(
    img: &mut RgbaImage,
    min: Pos2,
    max: Pos2,
    color: Rgba<u8>,
    mode: CompositeMode,
    covers: impl Fn(Pos2) -> bool,
) {
    let Some((x0, y0, x1, y1)) = clipped_range(img, min, max) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
            if covers(center) {
                composite(img.get_pixel_mut(x, y), color, mode, 1.0);
            }
        }
    }
}

/// Blends a single pixel with fractional coverage; out of bounds is ignored.
pub fn blend_pixel(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    blend_over(img.get_pixel_mut(x as u32, y as u32), color, coverage);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_source_replaces_destination() {
        let mut px = WHITE;
        blend_over(&mut px, Rgba([10, 20, 30, 255]), 1.0);
        assert_eq!(px, Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn half_transparent_black_over_white_is_grey() {
        let mut px = WHITE;
        blend_over(&mut px, Rgba([0, 0, 0, 128]), 1.0);
        assert_eq!(px[3], 255);
        assert!(px[0] > 120 && px[0] < 135);
    }

    #[test]
    fn full_erase_yields_transparent() {
        let mut px = Rgba([200, 10, 10, 255]);
        erase(&mut px, 1.0);
        assert_eq!(px, TRANSPARENT);
    }

    #[test]
    fn coverage_is_clipped_to_image() {
        let mut img = RgbaImage::from_pixel(4, 4, WHITE);
        paint_coverage(
            &mut img,
            Pos2::new(-10.0, -10.0),
            Pos2::new(2.0, 2.0),
            Rgba([0, 0, 0, 255]),
            CompositeMode::PaintOver,
            |_| true,
        );
        assert_eq!(*img.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(2, 2), WHITE);
    }
}
