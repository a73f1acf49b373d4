use egui::{Pos2, Vec2};
use uuid::Uuid;

use crate::config::{AppConfig, ResizePolicy};
use crate::document::{Note, NoteId};
use crate::error::{DrawingError, DrawingResult};
use crate::event::{DrawingEvent, EventBus};
use crate::history::{HistoryStack, Snapshot};
use crate::persistence::{ImagePayload, PersistenceResult};
use crate::state::EditorState;
use crate::surface::PixelSurface;
use crate::tools::{BrushSettings, ShapePreview, Tool, ToolContext, ToolEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Save,
    Load,
}

/// Identifies one asynchronous save or load started by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTicket {
    session: Uuid,
    seq: u64,
    kind: OpKind,
}

impl OpTicket {
    pub fn session_id(&self) -> Uuid {
        self.session
    }
}

/// Everything the host needs to hand a save to the store
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub ticket: OpTicket,
    pub payload: ImagePayload,
    /// Note to update, `None` to create a new drawing note
    pub target: Option<NoteId>,
    pub title: String,
}

/// One open drawing editor.
///
/// Owns the surface, its history and the tool state machine. Created when
/// the editor opens and dropped when it closes; nothing is shared between
/// sessions. While a save or load is in flight the canvas is read-only.
#[derive(Debug)]
pub struct DrawingSession {
    id: Uuid,
    surface: PixelSurface,
    history: HistoryStack,
    engine: ToolEngine,
    settings: BrushSettings,
    resize_policy: ResizePolicy,
    note_id: Option<NoteId>,
    pending: Option<OpTicket>,
    next_seq: u64,
    /// Bumped whenever the pixels may have changed, for texture re-upload
    surface_revision: u64,
    events: EventBus,
}

impl DrawingSession {
    pub fn new(surface: PixelSurface, config: &AppConfig) -> DrawingResult<Self> {
        let history = HistoryStack::new(&surface, config.history_depth)?;
        let session = Self {
            id: Uuid::new_v4(),
            surface,
            history,
            engine: ToolEngine::new(Tool::default()),
            settings: config.brush.clone(),
            resize_policy: config.resize_policy,
            note_id: None,
            pending: None,
            next_seq: 0,
            surface_revision: 0,
            events: EventBus::new(),
        };
        log::info!(
            "Drawing session {} opened ({}x{})",
            session.id,
            session.surface.width(),
            session.surface.height()
        );
        Ok(session)
    }

    /// A white canvas covering `logical_size` points at `scale` pixels per point
    pub fn blank(logical_size: Vec2, scale: f32, config: &AppConfig) -> DrawingResult<Self> {
        Self::new(PixelSurface::for_viewport(logical_size, scale)?, config)
    }

    /// Opens a stored drawing; the decoded image is the only history entry.
    pub fn open_existing(payload: &ImagePayload, note_id: NoteId, config: &AppConfig) -> DrawingResult<Self> {
        let surface = PixelSurface::decode(payload.bytes())?;
        let mut session = Self::new(surface, config)?;
        session.note_id = Some(note_id);
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn state(&self) -> &EditorState {
        self.engine.state()
    }

    pub fn tool(&self) -> Tool {
        self.engine.tool()
    }

    pub fn settings(&self) -> &BrushSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The note this drawing is saved into, once it has one
    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn surface_revision(&self) -> u64 {
        self.surface_revision
    }

    /// True while a save or load is outstanding
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn preview(&self) -> Option<ShapePreview> {
        self.engine.preview(&self.settings)
    }

    pub fn text_input(&self) -> Option<&str> {
        self.engine.text_input()
    }

    pub fn text_input_mut(&mut self) -> Option<&mut String> {
        self.engine.text_input_mut()
    }

    pub fn set_color(&mut self, color: [u8; 4]) {
        self.settings.color = color;
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.settings.set_line_width(width);
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.settings.set_font_size(size);
    }

    pub fn set_settings(&mut self, settings: BrushSettings) {
        self.settings = settings;
    }

    /// Device pixels per logical point reported by the host
    pub fn set_scale(&mut self, scale: f32) {
        self.surface.set_scale(scale);
    }

    fn input_blocked(&self, what: &str) -> bool {
        if self.pending.is_some() {
            log::debug!("Ignoring {what}: save or load in flight");
            return true;
        }
        false
    }

    /// Runs one engine transition and reports any history change.
    fn drive<R>(
        &mut self,
        f: impl FnOnce(&mut ToolEngine, ToolContext<'_>) -> DrawingResult<R>,
    ) -> DrawingResult<R> {
        let revision = self.history.revision();
        let ctx = ToolContext {
            surface: &mut self.surface,
            history: &mut self.history,
            settings: &self.settings,
        };
        let result = f(&mut self.engine, ctx);
        self.surface_revision += 1;
        self.notify_history(revision);
        result
    }

    fn notify_history(&self, since: u64) {
        if self.history.revision() != since {
            self.events.emit(DrawingEvent::HistoryChanged {
                can_undo: self.history.can_undo(),
                can_redo: self.history.can_redo(),
            });
        }
    }

    pub fn select_tool(&mut self, tool: Tool) -> DrawingResult<()> {
        if self.input_blocked("tool change") {
            return Ok(());
        }
        let previous = self.engine.tool();
        self.drive(|engine, ctx| engine.select_tool(tool, ctx))?;
        if previous != tool {
            self.events.emit(DrawingEvent::ToolChanged { tool: tool.name() });
        }
        Ok(())
    }

    pub fn begin_gesture(&mut self, point: Pos2) -> DrawingResult<()> {
        if self.input_blocked("pointer press") {
            return Ok(());
        }
        self.drive(|engine, ctx| engine.begin_gesture(point, ctx))
    }

    pub fn move_gesture(&mut self, point: Pos2) -> DrawingResult<()> {
        if self.pending.is_some() || self.engine.state().is_idle() {
            return Ok(());
        }
        self.drive(|engine, ctx| engine.move_gesture(point, ctx))
    }

    pub fn end_gesture(&mut self) -> DrawingResult<()> {
        if self.input_blocked("pointer release") {
            return Ok(());
        }
        self.drive(|engine, ctx| engine.end_gesture(ctx))
    }

    pub fn pointer_left(&mut self) -> DrawingResult<()> {
        if self.pending.is_some() {
            return Ok(());
        }
        self.drive(|engine, ctx| engine.pointer_left(ctx))
    }

    pub fn commit_text(&mut self) -> DrawingResult<()> {
        if self.input_blocked("text commit") {
            return Ok(());
        }
        self.drive(|engine, ctx| engine.commit_text(ctx))
    }

    pub fn cancel_text(&mut self) {
        self.engine.cancel_text();
    }

    pub fn clear(&mut self) -> DrawingResult<()> {
        if self.input_blocked("clear") {
            return Ok(());
        }
        self.drive(|engine, ctx| engine.clear(ctx))
    }

    /// Steps back one edit. Returns false at the base state.
    pub fn undo(&mut self) -> DrawingResult<bool> {
        if self.input_blocked("undo") {
            return Ok(false);
        }
        self.drive(|engine, mut ctx| {
            engine.finish(ctx.reborrow())?;
            ctx.history.undo(ctx.surface)
        })
    }

    /// Reapplies the last undone edit. Returns false when there is none.
    pub fn redo(&mut self) -> DrawingResult<bool> {
        if self.input_blocked("redo") {
            return Ok(false);
        }
        self.drive(|engine, mut ctx| {
            engine.finish(ctx.reborrow())?;
            ctx.history.redo(ctx.surface)
        })
    }

    /// Adapts the surface to a new pixel size following the resize policy.
    ///
    /// No history entry is added. On failure the surface is unchanged.
    pub fn resize(&mut self, width: i64, height: i64) -> DrawingResult<()> {
        if (width, height) == (self.surface.width() as i64, self.surface.height() as i64) {
            return Ok(());
        }
        self.drive(|engine, ctx| engine.finish(ctx))?;

        let mut resized = self.surface.clone();
        match self.resize_policy {
            ResizePolicy::RestoreFromHistory => {
                resized.reallocate(width, height)?;
                self.history.restore_current(&mut resized)?;
            }
            ResizePolicy::Stretch => resized.rescale(width, height)?,
        }
        log::debug!(
            "Surface resized {}x{} -> {width}x{height} ({:?})",
            self.surface.width(),
            self.surface.height(),
            self.resize_policy
        );
        self.surface = resized;
        self.surface_revision += 1;
        Ok(())
    }

    fn start_op(&mut self, kind: OpKind) -> DrawingResult<OpTicket> {
        if self.pending.is_some() {
            return Err(DrawingError::Busy);
        }
        self.next_seq += 1;
        let ticket = OpTicket {
            session: self.id,
            seq: self.next_seq,
            kind,
        };
        self.pending = Some(ticket);
        Ok(ticket)
    }

    /// Takes the pending op if `ticket` is the one outstanding.
    fn settle(&mut self, ticket: OpTicket) -> bool {
        if self.pending != Some(ticket) {
            log::warn!(
                "Discarding stale {:?} result for session {} (seq {})",
                ticket.kind,
                ticket.session,
                ticket.seq
            );
            return false;
        }
        self.pending = None;
        true
    }

    /// Encodes the drawing and marks the session busy until `finish_save`.
    ///
    /// Any open gesture or text box is committed first.
    pub fn begin_save(&mut self, title: &str) -> DrawingResult<SaveRequest> {
        if self.pending.is_some() {
            return Err(DrawingError::Busy);
        }
        self.drive(|engine, ctx| engine.finish(ctx))?;
        let payload = ImagePayload::new(self.surface.encode()?);
        let ticket = self.start_op(OpKind::Save)?;
        log::info!("Saving drawing ({} bytes)", payload.bytes().len());
        Ok(SaveRequest {
            ticket,
            payload,
            target: self.note_id.clone(),
            title: title.to_owned(),
        })
    }

    /// Applies the store's answer to a save.
    ///
    /// Returns `Ok(false)` for a result that no longer belongs to this
    /// session's outstanding save. A failed save keeps the drawing and its
    /// history so the user can retry.
    pub fn finish_save(&mut self, ticket: OpTicket, result: PersistenceResult<Note>) -> DrawingResult<bool> {
        if ticket.kind != OpKind::Save || !self.settle(ticket) {
            return Ok(false);
        }
        match result {
            Ok(note) => {
                log::info!("Drawing saved to note {}", note.id);
                self.note_id = Some(note.id.clone());
                self.events.emit(DrawingEvent::Saved { note_id: note.id });
                Ok(true)
            }
            Err(err) => {
                log::error!("Saving drawing failed: {err}");
                self.events.emit(DrawingEvent::SaveFailed {
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Marks the session busy while the host fetches a stored image.
    pub fn begin_load(&mut self) -> DrawingResult<OpTicket> {
        self.drive(|engine, ctx| engine.finish(ctx))?;
        self.start_op(OpKind::Load)
    }

    /// Replaces the canvas with a fetched image, which becomes the only
    /// history entry. On any failure the current canvas stays as it was.
    pub fn finish_load(&mut self, ticket: OpTicket, result: PersistenceResult<ImagePayload>) -> DrawingResult<bool> {
        if ticket.kind != OpKind::Load || !self.settle(ticket) {
            return Ok(false);
        }
        let loaded = result
            .map_err(DrawingError::from)
            .and_then(|payload| {
                let surface = PixelSurface::decode(payload.bytes())?;
                Ok((Snapshot::from_bytes(payload.into_bytes()), surface))
            });
        match loaded {
            Ok((base, surface)) => {
                let scale = self.surface.scale();
                self.surface = surface.with_scale(scale);
                self.history.reset(base);
                self.surface_revision += 1;
                self.events.emit(DrawingEvent::Loaded);
                self.events.emit(DrawingEvent::HistoryChanged {
                    can_undo: false,
                    can_redo: false,
                });
                Ok(true)
            }
            Err(err) => {
                log::error!("Loading drawing failed: {err}");
                self.events.emit(DrawingEvent::LoadFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Closes the editor. An outstanding save or load will be discarded.
    pub fn close(self) {
        if let Some(ticket) = self.pending {
            log::warn!(
                "Session {} closed with a {:?} in flight; its result will be dropped",
                self.id,
                ticket.kind
            );
        }
        log::info!("Drawing session {} closed", self.id);
    }
}
