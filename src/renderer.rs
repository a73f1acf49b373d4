use eframe::egui::{self, Color32, Pos2, Rect, Shape, Stroke, TextureHandle, TextureOptions};
use uuid::Uuid;

use crate::geometry::ShapeGeometry;
use crate::session::DrawingSession;
use crate::surface::PixelSurface;
use crate::tools::ShapePreview;

/// Maps between surface pixels and screen points for a canvas placed at `rect`
#[derive(Debug, Clone, Copy)]
pub struct CanvasTransform {
    pub rect: Rect,
    pub scale: f32,
}

impl CanvasTransform {
    pub fn new(rect: Rect, surface: &PixelSurface) -> Self {
        Self {
            rect,
            scale: surface.scale(),
        }
    }

    pub fn to_surface(&self, screen: Pos2) -> Pos2 {
        ((screen - self.rect.min) * self.scale).to_pos2()
    }

    pub fn to_screen(&self, surface: Pos2) -> Pos2 {
        self.rect.min + surface.to_vec2() / self.scale
    }
}

/// Keeps the GPU copy of a session's surface up to date and paints it
#[derive(Default)]
pub struct Renderer {
    texture: Option<TextureHandle>,
    /// Session and surface revision the texture was last built from
    uploaded: Option<(Uuid, u64)>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("has_texture", &self.texture.is_some())
            .field("uploaded", &self.uploaded)
            .finish()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn sync_texture(&mut self, ctx: &egui::Context, session: &DrawingSession) {
        let key = (session.id(), session.surface_revision());
        if self.uploaded == Some(key) && self.texture.is_some() {
            return;
        }
        let image = session.surface().to_color_image();
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("drawing_surface", image, TextureOptions::NEAREST));
            }
        }
        self.uploaded = Some(key);
    }

    /// Paints the surface into `transform.rect`, with the shape preview on top.
    pub fn render(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        transform: CanvasTransform,
        session: &DrawingSession,
    ) {
        self.sync_texture(ctx, session);
        if let Some(texture) = &self.texture {
            let size = session.surface().logical_size();
            let rect = Rect::from_min_size(transform.rect.min, size);
            let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }

        if let Some(preview) = session.preview() {
            painter.add(preview_shape(&preview, &transform));
        }
    }
}

/// Outline for a shape still being dragged; never touches the surface
pub fn preview_shape(preview: &ShapePreview, transform: &CanvasTransform) -> Shape {
    let [r, g, b, a] = preview.color.0;
    let stroke = Stroke::new(
        preview.line_width / transform.scale,
        Color32::from_rgba_unmultiplied(r, g, b, a),
    );
    match preview.geometry {
        ShapeGeometry::Line { from, to } => {
            Shape::line_segment([transform.to_screen(from), transform.to_screen(to)], stroke)
        }
        ShapeGeometry::Rectangle(rect) => Shape::rect_stroke(
            Rect::from_two_pos(transform.to_screen(rect.min), transform.to_screen(rect.max)),
            0.0,
            stroke,
        ),
        ShapeGeometry::Circle { center, radius } => {
            Shape::circle_stroke(transform.to_screen(center), radius / transform.scale, stroke)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ShapeKind;
    use image::Rgba;

    fn transform() -> CanvasTransform {
        CanvasTransform {
            rect: Rect::from_min_size(egui::pos2(10.0, 20.0), egui::vec2(100.0, 100.0)),
            scale: 2.0,
        }
    }

    #[test]
    fn screen_and_surface_points_map_both_ways() {
        let t = transform();
        let surface = t.to_surface(egui::pos2(15.0, 30.0));
        assert_eq!(surface, egui::pos2(10.0, 20.0));
        assert_eq!(t.to_screen(surface), egui::pos2(15.0, 30.0));
    }

    #[test]
    fn circle_preview_is_scaled_to_points() {
        let anchor = egui::pos2(0.0, 0.0);
        let end = egui::pos2(60.0, 80.0);
        let preview = ShapePreview {
            shape: ShapeKind::Circle,
            geometry: ShapeKind::Circle.geometry(anchor, end),
            color: Rgba([255, 0, 0, 255]),
            line_width: 4.0,
        };
        match preview_shape(&preview, &transform()) {
            Shape::Circle(circle) => {
                assert_eq!(circle.center, egui::pos2(25.0, 40.0));
                assert_eq!(circle.radius, 25.0);
                assert_eq!(circle.stroke.width, 2.0);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }
}
