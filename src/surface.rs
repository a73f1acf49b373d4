use std::io::Cursor;

use egui::{Pos2, Vec2};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::{DrawingError, DrawingResult};
use crate::geometry::{ShapeGeometry, ShapeKind};
use crate::raster::{self, CompositeMode};
use crate::text;

/// Largest edge accepted for a surface, in device pixels
pub const MAX_DIMENSION: i64 = 16_384;

/// Background color of fresh and cleared surfaces
pub const BACKGROUND: Rgba<u8> = raster::WHITE;

/// The mutable RGBA raster being edited.
///
/// The buffer always holds `width * height * 4` bytes. `scale` is the number
/// of device pixels per logical point of the host window.
#[derive(Clone, PartialEq)]
pub struct PixelSurface {
    image: RgbaImage,
    scale: f32,
}

// Custom Debug implementation so the pixel buffer isn't dumped into logs
impl std::fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

fn checked_dimensions(width: i64, height: i64) -> DrawingResult<(u32, u32)> {
    if width <= 0 || height <= 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(DrawingError::InvalidDimension { width, height });
    }
    Ok((width as u32, height as u32))
}

fn decode_png(bytes: &[u8]) -> DrawingResult<RgbaImage> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map(|img| img.to_rgba8())
        .map_err(|err| DrawingError::DecodeError(err.to_string()))
}

impl PixelSurface {
    /// Creates an opaque white surface of `width` x `height` device pixels.
    pub fn allocate(width: i64, height: i64) -> DrawingResult<Self> {
        let (width, height) = checked_dimensions(width, height)?;
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, BACKGROUND),
            scale: 1.0,
        })
    }

    /// Allocates a surface covering `logical_size` points at `scale` device pixels per point.
    pub fn for_viewport(logical_size: Vec2, scale: f32) -> DrawingResult<Self> {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let width = (logical_size.x * scale).round() as i64;
        let height = (logical_size.y * scale).round() as i64;
        Ok(Self::allocate(width, height)?.with_scale(scale))
    }

    /// Decodes a stored PNG into a freshly allocated surface of the image's size.
    pub fn decode(bytes: &[u8]) -> DrawingResult<Self> {
        let image = decode_png(bytes)?;
        checked_dimensions(image.width() as i64, image.height() as i64)?;
        Ok(Self { image, scale: 1.0 })
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    /// Maps a host position in logical points to surface pixels.
    pub fn to_surface(&self, logical: Pos2) -> Pos2 {
        Pos2::new(logical.x * self.scale, logical.y * self.scale)
    }

    /// Maps a surface pixel position back to logical points.
    pub fn to_logical(&self, surface: Pos2) -> Pos2 {
        Pos2::new(surface.x / self.scale, surface.y / self.scale)
    }

    /// Logical size of the surface in points
    pub fn logical_size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32) / self.scale
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    pub fn pixel(&self, x: i64, y: i64) -> Option<Rgba<u8>> {
        self.contains(x, y).then(|| *self.image.get_pixel(x as u32, y as u32))
    }

    /// Overwrites one pixel without blending. Returns false when out of bounds.
    pub fn set_pixel(&mut self, x: i64, y: i64, color: Rgba<u8>) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        self.image.put_pixel(x as u32, y as u32, color);
        true
    }

    /// Raw RGBA bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.image.pixels_mut() {
            *px = color;
        }
    }

    /// Resets every pixel to the opaque white background.
    pub fn clear(&mut self) {
        self.fill(BACKGROUND);
    }

    /// Strokes a segment with round caps.
    pub fn paint_stroke(
        &mut self,
        from: Pos2,
        to: Pos2,
        color: Rgba<u8>,
        line_width: f32,
        mode: CompositeMode,
    ) {
        let geometry = ShapeGeometry::Line { from, to };
        self.paint_geometry(&geometry, color, line_width, mode);
    }

    /// Strokes the outline of `kind` spanned by `anchor` and `endpoint`.
    pub fn paint_shape(
        &mut self,
        kind: ShapeKind,
        anchor: Pos2,
        endpoint: Pos2,
        color: Rgba<u8>,
        line_width: f32,
    ) {
        let geometry = kind.geometry(anchor, endpoint);
        self.paint_geometry(&geometry, color, line_width, CompositeMode::PaintOver);
    }

    fn paint_geometry(
        &mut self,
        geometry: &ShapeGeometry,
        color: Rgba<u8>,
        line_width: f32,
        mode: CompositeMode,
    ) {
        let half_width = (line_width / 2.0).max(0.5);
        let bounds = geometry.bounds(half_width);
        raster::paint_coverage(&mut self.image, bounds.min, bounds.max, color, mode, |p| {
            geometry.covers(p, half_width)
        });
    }

    /// Draws `text` with its baseline `font_size` pixels below `point`,
    /// so `point` is the top-left corner of the text box.
    pub fn paint_text(&mut self, point: Pos2, text: &str, color: Rgba<u8>, font_size: f32) {
        let baseline = Pos2::new(point.x, point.y + font_size);
        if !text::draw_text(&mut self.image, baseline, text, color, font_size) {
            log::warn!("No font available, text {text:?} was not drawn");
        }
    }

    /// Encodes the surface as PNG.
    pub fn encode(&self) -> DrawingResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|err| DrawingError::EncodeError(err.to_string()))?;
        Ok(bytes)
    }

    /// Replaces the surface contents with a decoded PNG.
    ///
    /// The surface keeps its dimensions: an image of the same size is copied
    /// exactly, any other size is drawn at the origin over the white
    /// background and cropped. On a decode failure nothing changes.
    pub fn decode_into(&mut self, bytes: &[u8]) -> DrawingResult<()> {
        let decoded = decode_png(bytes)?;
        if decoded.dimensions() == self.image.dimensions() {
            self.image = decoded;
        } else {
            self.clear();
            imageops::replace(&mut self.image, &decoded, 0, 0);
        }
        Ok(())
    }

    /// Reallocates to the new size, stretching the current content to fit.
    pub fn rescale(&mut self, width: i64, height: i64) -> DrawingResult<()> {
        let (width, height) = checked_dimensions(width, height)?;
        if (width, height) != self.image.dimensions() {
            self.image = imageops::resize(&self.image, width, height, FilterType::Triangle);
        }
        Ok(())
    }

    /// Reallocates to the new size with a white background, discarding content.
    pub fn reallocate(&mut self, width: i64, height: i64) -> DrawingResult<()> {
        let (width, height) = checked_dimensions(width, height)?;
        self.image = RgbaImage::from_pixel(width, height, BACKGROUND);
        Ok(())
    }

    /// Copy of the pixels in the form egui uploads as a texture
    pub fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage::from_rgba_unmultiplied(
            [self.width() as usize, self.height() as usize],
            self.image.as_raw(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn allocate_rejects_empty_dimensions() {
        assert!(matches!(
            PixelSurface::allocate(0, 10),
            Err(DrawingError::InvalidDimension { width: 0, height: 10 })
        ));
        assert!(PixelSurface::allocate(10, -3).is_err());
    }

    #[test]
    fn allocate_is_white_and_sized() {
        let surface = PixelSurface::allocate(7, 3).unwrap();
        assert_eq!(surface.as_raw().len(), 7 * 3 * 4);
        assert!(surface.as_raw().iter().all(|&b| b == 255));
    }

    #[test]
    fn viewport_allocation_applies_scale() {
        let surface = PixelSurface::for_viewport(Vec2::new(100.0, 50.0), 2.0).unwrap();
        assert_eq!((surface.width(), surface.height()), (200, 100));
        assert_eq!(surface.to_surface(Pos2::new(10.0, 4.0)), Pos2::new(20.0, 8.0));
        assert_eq!(surface.to_logical(Pos2::new(20.0, 8.0)), Pos2::new(10.0, 4.0));
        assert_eq!(surface.logical_size(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn stroke_covers_its_endpoints() {
        let mut surface = PixelSurface::allocate(20, 20).unwrap();
        surface.paint_stroke(Pos2::new(2.0, 2.0), Pos2::new(15.0, 2.0), BLACK, 2.0, CompositeMode::PaintOver);
        assert_eq!(surface.pixel(2, 2), Some(BLACK));
        assert_eq!(surface.pixel(14, 2), Some(BLACK));
        assert_eq!(surface.pixel(8, 10), Some(BACKGROUND));
    }

    #[test]
    fn zero_length_stroke_paints_round_cap() {
        let mut surface = PixelSurface::allocate(12, 12).unwrap();
        let point = Pos2::new(6.0, 6.0);
        surface.paint_stroke(point, point, BLACK, 4.0, CompositeMode::PaintOver);
        assert_eq!(surface.pixel(5, 5), Some(BLACK));
        assert_eq!(surface.pixel(4, 6), Some(BLACK));
        assert_eq!(surface.pixel(8, 8), Some(BACKGROUND));
        assert_eq!(surface.pixel(6, 9), Some(BACKGROUND));
    }

    #[test]
    fn eraser_clears_alpha() {
        let mut surface = PixelSurface::allocate(10, 10).unwrap();
        surface.paint_stroke(Pos2::new(0.0, 5.0), Pos2::new(10.0, 5.0), BLACK, 2.0, CompositeMode::Erase);
        assert_eq!(surface.pixel(5, 5), Some(raster::TRANSPARENT));
        assert_eq!(surface.pixel(5, 0), Some(BACKGROUND));
    }

    #[test]
    fn circle_outline_uses_diagonal_radius() {
        let mut surface = PixelSurface::allocate(200, 100).unwrap();
        surface.paint_shape(ShapeKind::Circle, Pos2::new(10.0, 10.0), Pos2::new(110.0, 50.0), BLACK, 2.0);
        // (60, 30) is the center, 53.85 px to the right lies on the outline
        assert_eq!(surface.pixel(60, 30), Some(BACKGROUND));
        assert_eq!(surface.pixel(113, 30), Some(BLACK));
        // a half-width radius (50) would have put ink here instead
        assert_eq!(surface.pixel(109, 30), Some(BACKGROUND));
    }

    #[test]
    fn encode_decode_is_lossless() {
        let mut surface = PixelSurface::allocate(16, 16).unwrap();
        surface.paint_stroke(Pos2::new(0.0, 0.0), Pos2::new(16.0, 16.0), Rgba([200, 30, 90, 180]), 3.0, CompositeMode::PaintOver);
        surface.paint_stroke(Pos2::new(0.0, 16.0), Pos2::new(16.0, 0.0), BLACK, 3.0, CompositeMode::Erase);
        let bytes = surface.encode().unwrap();

        let mut restored = PixelSurface::allocate(16, 16).unwrap();
        restored.decode_into(&bytes).unwrap();
        assert_eq!(restored.as_raw(), surface.as_raw());
    }

    #[test]
    fn decode_into_rejects_garbage_and_keeps_pixels() {
        let mut surface = PixelSurface::allocate(4, 4).unwrap();
        surface.set_pixel(1, 1, BLACK);
        let before = surface.clone();
        assert!(matches!(surface.decode_into(b"not a png"), Err(DrawingError::DecodeError(_))));
        assert_eq!(surface, before);
    }

    #[test]
    fn decode_into_smaller_surface_crops() {
        let mut big = PixelSurface::allocate(8, 8).unwrap();
        big.set_pixel(1, 1, BLACK);
        big.set_pixel(6, 6, BLACK);
        let bytes = big.encode().unwrap();

        let mut small = PixelSurface::allocate(4, 4).unwrap();
        small.decode_into(&bytes).unwrap();
        assert_eq!((small.width(), small.height()), (4, 4));
        assert_eq!(small.pixel(1, 1), Some(BLACK));
    }

    #[test]
    fn rescale_stretches_content() {
        let mut surface = PixelSurface::allocate(10, 10).unwrap();
        surface.fill(BLACK);
        surface.rescale(20, 5).unwrap();
        assert_eq!((surface.width(), surface.height()), (20, 5));
        assert_eq!(surface.as_raw().len(), 20 * 5 * 4);
        assert_eq!(surface.pixel(19, 4), Some(BLACK));
        assert!(surface.rescale(0, 5).is_err());
    }

    #[test]
    fn text_is_anchored_at_top_left() {
        let mut surface = PixelSurface::allocate(100, 60).unwrap();
        surface.paint_text(Pos2::new(10.0, 10.0), "T", BLACK, 20.0);
        let ink_rows: Vec<u32> = surface
            .image()
            .enumerate_pixels()
            .filter(|(_, _, px)| **px != BACKGROUND)
            .map(|(_, y, _)| y)
            .collect();
        assert!(!ink_rows.is_empty());
        assert!(ink_rows.iter().all(|&y| (10..=31).contains(&y)));
    }
}
