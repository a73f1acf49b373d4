use crate::document::NoteId;

/// Notifications a drawing session sends to the host UI
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingEvent {
    /// Undo/redo availability may have changed
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// The active tool changed
    ToolChanged { tool: &'static str },
    /// A save completed; later saves update the same note
    Saved { note_id: NoteId },
    /// A save failed; the drawing is still in memory and can be saved again
    SaveFailed { reason: String },
    /// A stored drawing was decoded and is now being edited
    Loaded,
    /// A stored drawing could not be loaded; the previous canvas is kept
    LoadFailed { reason: String },
}
