use std::borrow::Cow;
use std::sync::OnceLock;

use ab_glyph::{point, Font, FontArc, FontRef, FontVec, ScaleFont};
use egui::Pos2;
use image::{Rgba, RgbaImage};

use crate::raster;

/// Proportional font bundled with egui, parsed once per process.
fn default_font() -> Option<&'static FontArc> {
    static FONT: OnceLock<Option<FontArc>> = OnceLock::new();
    FONT.get_or_init(|| {
        let definitions = egui::FontDefinitions::default();
        let family = definitions.families.get(&egui::FontFamily::Proportional)?;
        let name = family.first()?;
        let data = definitions.font_data.get(name)?;
        let font = match &data.font {
            Cow::Borrowed(bytes) => FontRef::try_from_slice_and_index(*bytes, data.index)
                .map(FontArc::from)
                .ok(),
            Cow::Owned(bytes) => FontVec::try_from_vec_and_index(bytes.clone(), data.index)
                .map(FontArc::from)
                .ok(),
        };
        if font.is_none() {
            log::warn!("Failed to parse bundled font {name}; text tool disabled");
        }
        font
    })
    .as_ref()
}

/// Rasterizes a single line of text with its baseline at `baseline.y`.
///
/// Glyph edges are anti-aliased. Pixels outside the image are skipped.
/// Returns false when no font is available.
pub fn draw_text(img: &mut RgbaImage, baseline: Pos2, text: &str, color: Rgba<u8>, size: f32) -> bool {
    let Some(font) = default_font() else {
        return false;
    };
    if text.is_empty() || size <= 0.0 {
        return true;
    }

    let scaled = font.as_scaled(size);
    let mut caret = point(baseline.x, baseline.y);
    let mut previous = None;
    for ch in text.chars() {
        let mut glyph = scaled.scaled_glyph(ch);
        if let Some(prev) = previous {
            caret.x += scaled.kern(prev, glyph.id);
        }
        glyph.position = caret;
        caret.x += scaled.h_advance(glyph.id);
        previous = Some(glyph.id);

        if let Some(outlined) = scaled.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, coverage| {
                let px = x as i64 + bounds.min.x as i64;
                let py = y as i64 + bounds.min.y as i64;
                raster::blend_pixel(img, px, py, color, coverage);
            });
        }
    }
    true
}
