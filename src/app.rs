use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::BoxFuture;

use crate::config::AppConfig;
use crate::document::Note;
use crate::event::DrawingEvent;
use crate::panels::{central_panel, report, tools_panel, CanvasView, EditorAction};
use crate::persistence::{DrawingStore, FileNoteStore, ImagePayload, PersistenceError, PersistenceResult};
use crate::session::{DrawingSession, OpTicket};
use crate::tools::BrushSettings;

/// An open drawing editor and the widgets bound to it
struct Editor {
    session: DrawingSession,
    canvas: CanvasView,
    title: String,
    events: Rc<RefCell<Vec<DrawingEvent>>>,
}

impl Editor {
    fn new(session: DrawingSession, title: String) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session
            .events()
            .subscribe(move |event: &DrawingEvent| sink.borrow_mut().push(event.clone()));
        Self {
            session,
            canvas: CanvasView::new(),
            title,
            events,
        }
    }
}

/// A storage call running on a worker thread
enum Job {
    Save {
        ticket: OpTicket,
        rx: oneshot::Receiver<PersistenceResult<Note>>,
    },
    Revert {
        ticket: OpTicket,
        rx: oneshot::Receiver<PersistenceResult<ImagePayload>>,
    },
    Open {
        note: Note,
        rx: oneshot::Receiver<PersistenceResult<ImagePayload>>,
    },
}

/// Runs `task` off the UI thread and wakes the UI when it completes
fn spawn<T: Send + 'static>(ctx: &egui::Context, task: BoxFuture<'static, T>) -> oneshot::Receiver<T> {
    let (tx, rx) = oneshot::channel();
    let ctx = ctx.clone();
    std::thread::spawn(move || {
        let result = futures::executor::block_on(task);
        // the receiver is gone if the app shut down meanwhile
        let _ = tx.send(result);
        ctx.request_repaint();
    });
    rx
}

fn poll<T>(rx: &mut oneshot::Receiver<PersistenceResult<T>>) -> Option<PersistenceResult<T>> {
    match rx.try_recv() {
        Ok(result) => result,
        Err(oneshot::Canceled) => Some(Err(PersistenceError::Cancelled)),
    }
}

/// We derive Deserialize/Serialize so we can persist the brush on shutdown.
#[derive(serde::Deserialize, serde::Serialize, Default)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct NoteSketchApp {
    brush: BrushSettings,
    #[serde(skip)]
    config: AppConfig,
    #[serde(skip)]
    store: Option<FileNoteStore>,
    #[serde(skip)]
    notes: Vec<Note>,
    #[serde(skip)]
    editor: Option<Editor>,
    #[serde(skip)]
    jobs: Vec<Job>,
    #[serde(skip)]
    status: Option<String>,
}

impl NoteSketchApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app: Self = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_else(|| Self {
                brush: config.brush.clone(),
                ..Default::default()
            });

        let data_dir = config.data_dir();
        match FileNoteStore::open(&data_dir) {
            Ok(store) => app.store = Some(store),
            Err(err) => {
                log::error!("Could not open note store at {}: {err}", data_dir.display());
                app.status = Some(format!("Notes unavailable: {err}"));
            }
        }
        app.config = config;
        app.refresh_notes();
        app
    }

    fn refresh_notes(&mut self) {
        if let Some(store) = &self.store {
            self.notes = store.drawing_notes();
        }
    }

    fn open_editor(&mut self, session: DrawingSession, title: String) {
        let mut editor = Editor::new(session, title);
        editor.session.set_settings(self.brush.clone());
        if let Some(previous) = self.editor.replace(editor) {
            previous.session.close();
        }
    }

    fn new_drawing(&mut self, ctx: &egui::Context) {
        let size = egui::vec2(self.config.canvas_width, self.config.canvas_height);
        match DrawingSession::blank(size, ctx.pixels_per_point(), &self.config) {
            Ok(session) => self.open_editor(session, String::new()),
            Err(err) => {
                log::error!("Could not create drawing: {err}");
                self.status = Some(err.to_string());
            }
        }
    }

    fn open_drawing(&mut self, ctx: &egui::Context, note: Note) {
        let (Some(store), Some(path)) = (&self.store, note.drawing_path.as_deref()) else {
            return;
        };
        log::info!("Opening drawing of note {}", note.id);
        let rx = spawn(ctx, store.load_drawing_image(path));
        self.jobs.push(Job::Open { note, rx });
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: EditorAction) {
        let Some(editor) = &mut self.editor else {
            return;
        };
        match action {
            EditorAction::Save => {
                let Some(store) = &self.store else {
                    self.status = Some("Cannot save: notes unavailable".to_owned());
                    return;
                };
                match editor.session.begin_save(&editor.title) {
                    Ok(request) => {
                        let task = store.save_drawing(request.payload, request.target, request.title);
                        let rx = spawn(ctx, task);
                        self.jobs.push(Job::Save {
                            ticket: request.ticket,
                            rx,
                        });
                    }
                    Err(err) => self.status = Some(format!("Save failed: {err}")),
                }
            }
            EditorAction::Revert => {
                let path = editor
                    .session
                    .note_id()
                    .and_then(|id| self.store.as_ref()?.note(id))
                    .and_then(|note| note.drawing_path);
                let (Some(store), Some(path)) = (&self.store, path) else {
                    return;
                };
                match editor.session.begin_load() {
                    Ok(ticket) => {
                        let rx = spawn(ctx, store.load_drawing_image(&path));
                        self.jobs.push(Job::Revert { ticket, rx });
                    }
                    Err(err) => self.status = Some(format!("Revert failed: {err}")),
                }
            }
            EditorAction::Close => {
                if let Some(editor) = self.editor.take() {
                    editor.session.close();
                }
                self.refresh_notes();
            }
        }
    }

    /// Delivers finished storage calls to the editor that started them.
    fn poll_jobs(&mut self) {
        let mut refresh = false;
        for mut job in std::mem::take(&mut self.jobs) {
            match &mut job {
                Job::Save { ticket, rx } => {
                    let Some(result) = poll(rx) else {
                        self.jobs.push(job);
                        continue;
                    };
                    refresh |= result.is_ok();
                    match self.editor_for(*ticket) {
                        Some(editor) => report("Save", editor.session.finish_save(*ticket, result)),
                        None => log::warn!("Discarding save result for a closed editor"),
                    }
                }
                Job::Revert { ticket, rx } => {
                    let Some(result) = poll(rx) else {
                        self.jobs.push(job);
                        continue;
                    };
                    match self.editor_for(*ticket) {
                        Some(editor) => report("Load", editor.session.finish_load(*ticket, result)),
                        None => log::warn!("Discarding load result for a closed editor"),
                    }
                }
                Job::Open { note, rx } => {
                    let Some(result) = poll(rx) else {
                        self.jobs.push(job);
                        continue;
                    };
                    let note = note.clone();
                    self.finish_open(note, result);
                }
            }
        }
        if refresh {
            self.refresh_notes();
        }
    }

    fn editor_for(&mut self, ticket: OpTicket) -> Option<&mut Editor> {
        self.editor
            .as_mut()
            .filter(|editor| editor.session.id() == ticket.session_id())
    }

    fn finish_open(&mut self, note: Note, result: PersistenceResult<ImagePayload>) {
        if self.editor.is_some() {
            log::warn!("Another drawing was opened meanwhile; dropping note {}", note.id);
            return;
        }
        let opened = result
            .map_err(Into::into)
            .and_then(|payload| DrawingSession::open_existing(&payload, note.id.clone(), &self.config));
        match opened {
            Ok(session) => self.open_editor(session, note.title),
            Err(err) => {
                log::error!("Could not open drawing of note {}: {err}", note.id);
                self.status = Some(format!("Could not open drawing: {err}"));
            }
        }
    }

    fn drain_events(&mut self) {
        let Some(editor) = &self.editor else {
            return;
        };
        let events = std::mem::take(&mut *editor.events.borrow_mut());
        for event in events {
            match event {
                DrawingEvent::Saved { note_id } => self.status = Some(format!("Saved to {note_id}")),
                DrawingEvent::SaveFailed { reason } => self.status = Some(format!("Save failed: {reason}")),
                DrawingEvent::Loaded => self.status = Some("Reverted to saved version".to_owned()),
                DrawingEvent::LoadFailed { reason } => self.status = Some(format!("Load failed: {reason}")),
                DrawingEvent::HistoryChanged { .. } | DrawingEvent::ToolChanged { .. } => {}
            }
        }
    }

    fn drawing_list(&mut self, ctx: &egui::Context) {
        let mut open = None;
        let mut create = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Drawings");
                if ui.button("New drawing").clicked() {
                    create = true;
                }
            });
            if let Some(status) = &self.status {
                ui.label(status);
            }
            ui.separator();

            if self.notes.is_empty() {
                ui.label("No drawings yet.");
            }
            let opening = self.jobs.iter().any(|job| matches!(job, Job::Open { .. }));
            egui::ScrollArea::vertical().show(ui, |ui| {
                for note in &self.notes {
                    ui.horizontal(|ui| {
                        ui.strong(&note.title);
                        ui.label(
                            note.updated_at
                                .with_timezone(&chrono::Local)
                                .format("%Y-%m-%d %H:%M")
                                .to_string(),
                        );
                        if ui.add_enabled(!opening, egui::Button::new("Open")).clicked() {
                            open = Some(note.clone());
                        }
                    });
                }
            });
        });

        if create {
            self.new_drawing(ctx);
        } else if let Some(note) = open {
            self.open_drawing(ctx, note);
        }
    }
}

impl eframe::App for NoteSketchApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs();
        self.drain_events();

        if self.editor.is_none() {
            self.drawing_list(ctx);
            return;
        }
        let Some(editor) = &mut self.editor else {
            return;
        };

        let action = tools_panel(ctx, &mut editor.session, &mut editor.title);
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(self.status.as_deref().unwrap_or(""));
        });
        central_panel(ctx, &mut editor.session, &mut editor.canvas);

        if editor.session.settings() != &self.brush {
            self.brush = editor.session.settings().clone();
        }
        if let Some(action) = action {
            self.handle_action(ctx, action);
        }
    }
}
