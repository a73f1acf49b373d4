use egui::Pos2;

use super::{BrushSettings, ShapePreview, Tool};
use crate::error::DrawingResult;
use crate::fill::flood_fill;
use crate::history::HistoryStack;
use crate::state::{EditorState, TextOverlay};
use crate::surface::PixelSurface;

/// Everything a gesture may touch, borrowed for the duration of one event
pub struct ToolContext<'a> {
    pub surface: &'a mut PixelSurface,
    pub history: &'a mut HistoryStack,
    pub settings: &'a BrushSettings,
}

/// Turns pointer and keyboard events into surface edits.
///
/// Each completed gesture (stroke, shape, fill, text insertion) is recorded
/// as exactly one history entry. Coordinates are surface pixels.
#[derive(Debug, Default)]
pub struct ToolEngine {
    tool: Tool,
    state: EditorState,
}

impl ToolEngine {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            state: EditorState::Idle,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Switches tools, first finishing whatever gesture is open.
    pub fn select_tool(&mut self, tool: Tool, ctx: ToolContext<'_>) -> DrawingResult<()> {
        self.finish(ctx)?;
        if tool != self.tool {
            log::debug!("Tool changed: {} -> {}", self.tool.name(), tool.name());
            self.tool = tool;
        }
        Ok(())
    }

    /// Pointer pressed at `point`.
    pub fn begin_gesture(&mut self, point: Pos2, mut ctx: ToolContext<'_>) -> DrawingResult<()> {
        if !self.state.is_idle() {
            // a release or blur was missed; settle the old gesture first
            self.finish(ctx.reborrow())?;
        }

        if let Some(mode) = self.tool.freehand_mode() {
            ctx.history.begin_gesture();
            self.state = EditorState::Stroking { last: point, mode };
        } else if let Some(shape) = self.tool.shape() {
            ctx.history.begin_gesture();
            self.state = EditorState::ShapePending {
                shape,
                anchor: point,
                current: point,
            };
        } else if self.tool == Tool::Fill {
            self.state = EditorState::Filling;
            let filled = flood_fill(ctx.surface, point, ctx.settings.rgba());
            self.state = EditorState::Idle;
            if filled > 0 {
                ctx.history.snapshot(ctx.surface)?;
            }
        } else {
            self.state = EditorState::TextEditing(TextOverlay {
                origin: point,
                text: String::new(),
            });
        }
        log::debug!("{} gesture began at {:?}: {}", self.tool.name(), point, self.state.name());
        Ok(())
    }

    /// Pointer dragged to `point`.
    pub fn move_gesture(&mut self, point: Pos2, ctx: ToolContext<'_>) -> DrawingResult<()> {
        match &mut self.state {
            EditorState::Stroking { last, mode } => {
                ctx.surface
                    .paint_stroke(*last, point, ctx.settings.rgba(), ctx.settings.line_width, *mode);
                *last = point;
            }
            EditorState::ShapePending { current, .. } => *current = point,
            EditorState::Idle | EditorState::Filling | EditorState::TextEditing(_) => {}
        }
        Ok(())
    }

    /// Pointer released. Commits an open stroke or shape.
    pub fn end_gesture(&mut self, ctx: ToolContext<'_>) -> DrawingResult<()> {
        match std::mem::take(&mut self.state) {
            EditorState::Stroking { .. } => {
                ctx.history.end_gesture();
                ctx.history.snapshot(ctx.surface)?;
            }
            EditorState::ShapePending {
                shape,
                anchor,
                current,
            } => {
                ctx.surface.paint_shape(
                    shape,
                    anchor,
                    current,
                    ctx.settings.rgba(),
                    ctx.settings.line_width,
                );
                ctx.history.end_gesture();
                ctx.history.snapshot(ctx.surface)?;
            }
            // the text box outlives the click that opened it
            text @ EditorState::TextEditing(_) => self.state = text,
            EditorState::Idle | EditorState::Filling => {}
        }
        Ok(())
    }

    /// Pointer left the canvas; handled as a release so nothing stays uncommitted.
    pub fn pointer_left(&mut self, ctx: ToolContext<'_>) -> DrawingResult<()> {
        self.end_gesture(ctx)
    }

    /// Current contents of the open text box
    pub fn text_input(&self) -> Option<&str> {
        self.state.text_overlay().map(|overlay| overlay.text.as_str())
    }

    /// Mutable text of the open text box, for the host's input widget
    pub fn text_input_mut(&mut self) -> Option<&mut String> {
        self.state.text_overlay_mut().map(|overlay| &mut overlay.text)
    }

    /// Enter or focus loss: paints the trimmed text if any and closes the box.
    pub fn commit_text(&mut self, ctx: ToolContext<'_>) -> DrawingResult<()> {
        if !matches!(self.state, EditorState::TextEditing(_)) {
            return Ok(());
        }
        let EditorState::TextEditing(overlay) = std::mem::take(&mut self.state) else {
            return Ok(());
        };
        let text = overlay.text.trim();
        if !text.is_empty() {
            ctx.surface
                .paint_text(overlay.origin, text, ctx.settings.rgba(), ctx.settings.font_size);
            ctx.history.snapshot(ctx.surface)?;
        }
        Ok(())
    }

    /// Escape: discards the open text box.
    pub fn cancel_text(&mut self) {
        if matches!(self.state, EditorState::TextEditing(_)) {
            self.state = EditorState::Idle;
        }
    }

    /// Fills the surface with the background and records it as one edit.
    pub fn clear(&mut self, mut ctx: ToolContext<'_>) -> DrawingResult<()> {
        self.finish(ctx.reborrow())?;
        ctx.surface.clear();
        ctx.history.snapshot(ctx.surface)?;
        Ok(())
    }

    /// Brings the engine back to `Idle`, committing an open gesture or text box.
    pub fn finish(&mut self, ctx: ToolContext<'_>) -> DrawingResult<()> {
        match self.state {
            EditorState::TextEditing(_) => self.commit_text(ctx),
            _ => self.end_gesture(ctx),
        }
    }

    /// Outline to draw over the canvas while a shape is being dragged
    pub fn preview(&self, settings: &BrushSettings) -> Option<ShapePreview> {
        match self.state {
            EditorState::ShapePending {
                shape,
                anchor,
                current,
            } => Some(ShapePreview {
                shape,
                geometry: shape.geometry(anchor, current),
                color: settings.rgba(),
                line_width: settings.line_width,
            }),
            _ => None,
        }
    }
}

impl ToolContext<'_> {
    /// Shorter-lived copy of the context so it can be passed on more than once
    pub fn reborrow(&mut self) -> ToolContext<'_> {
        ToolContext {
            surface: self.surface,
            history: self.history,
            settings: self.settings,
        }
    }
}
