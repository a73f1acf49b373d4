use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::geometry::{ShapeGeometry, ShapeKind};
use crate::raster::CompositeMode;

mod engine;
pub use engine::{ToolContext, ToolEngine};

/// Every tool the drawing editor offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Pencil,
    Brush,
    Eraser,
    Fill,
    Line,
    Rectangle,
    Circle,
    Text,
}

impl Tool {
    /// Toolbar order
    pub const ALL: [Tool; 8] = [
        Tool::Pencil,
        Tool::Brush,
        Tool::Eraser,
        Tool::Fill,
        Tool::Line,
        Tool::Rectangle,
        Tool::Circle,
        Tool::Text,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pencil => "Pencil",
            Self::Brush => "Brush",
            Self::Eraser => "Eraser",
            Self::Fill => "Fill",
            Self::Line => "Line",
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
            Self::Text => "Text",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pencil => "✏",
            Self::Brush => "🖌",
            Self::Eraser => "⌫",
            Self::Fill => "🪣",
            Self::Line => "╱",
            Self::Rectangle => "▭",
            Self::Circle => "◯",
            Self::Text => "T",
        }
    }

    /// Compositing for freehand tools, `None` for everything else
    pub fn freehand_mode(&self) -> Option<CompositeMode> {
        match self {
            Self::Pencil | Self::Brush => Some(CompositeMode::PaintOver),
            Self::Eraser => Some(CompositeMode::Erase),
            _ => None,
        }
    }

    pub fn shape(&self) -> Option<ShapeKind> {
        match self {
            Self::Line => Some(ShapeKind::Line),
            Self::Rectangle => Some(ShapeKind::Rectangle),
            Self::Circle => Some(ShapeKind::Circle),
            _ => None,
        }
    }
}

/// User-adjustable drawing parameters shared by all tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    /// Stroke and fill color, unpremultiplied RGBA
    pub color: [u8; 4],
    /// Stroke thickness in surface pixels
    pub line_width: f32,
    /// Text height in surface pixels
    pub font_size: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            line_width: 5.0,
            font_size: 20.0,
        }
    }
}

impl BrushSettings {
    pub const MIN_LINE_WIDTH: f32 = 1.0;
    pub const MAX_LINE_WIDTH: f32 = 50.0;

    pub fn rgba(&self) -> Rgba<u8> {
        Rgba(self.color)
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width.clamp(Self::MIN_LINE_WIDTH, Self::MAX_LINE_WIDTH);
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = size.clamp(Self::MIN_LINE_WIDTH, 200.0);
    }
}

/// Shape outline shown on the overlay while a shape gesture is open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapePreview {
    pub shape: ShapeKind,
    pub geometry: ShapeGeometry,
    pub color: Rgba<u8>,
    pub line_width: f32,
}
