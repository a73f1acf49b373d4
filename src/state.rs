use egui::Pos2;

use crate::geometry::ShapeKind;
use crate::raster::CompositeMode;

/// Text box opened by the text tool, waiting for the user to type
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    /// Top-left corner of the box in surface pixels
    pub origin: Pos2,
    pub text: String,
}

/// Where the active tool is within a gesture.
///
/// Only one variant can be live at a time, so two tools can never be
/// mid-gesture together.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    /// Freehand drag in progress (pencil, brush or eraser)
    Stroking { last: Pos2, mode: CompositeMode },
    /// Shape tool anchored, previewing toward `current`
    ShapePending {
        shape: ShapeKind,
        anchor: Pos2,
        current: Pos2,
    },
    /// Flood fill running; never observed between events
    Filling,
    TextEditing(TextOverlay),
}

impl EditorState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Stroking { .. } => "Stroking",
            Self::ShapePending { .. } => "ShapePending",
            Self::Filling => "Filling",
            Self::TextEditing(_) => "TextEditing",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// True while a pointer drag is open (stroke or shape)
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Stroking { .. } | Self::ShapePending { .. })
    }

    pub fn text_overlay(&self) -> Option<&TextOverlay> {
        match self {
            Self::TextEditing(overlay) => Some(overlay),
            _ => None,
        }
    }

    pub fn text_overlay_mut(&mut self) -> Option<&mut TextOverlay> {
        match self {
            Self::TextEditing(overlay) => Some(overlay),
            _ => None,
        }
    }
}
