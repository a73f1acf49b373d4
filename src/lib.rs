#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod components;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod fill;
pub mod geometry;
pub mod history;
pub mod panels;
pub mod persistence;
pub mod raster;
pub mod renderer;
pub mod session;
pub mod state;
pub mod surface;
pub mod text;
pub mod tools;

pub use app::NoteSketchApp;
pub use config::{AppConfig, ResizePolicy};
pub use document::{Note, NoteId, NotesDocument};
pub use error::{DrawingError, DrawingResult};
pub use event::{DrawingEvent, EventBus};
pub use fill::flood_fill;
pub use history::HistoryStack;
pub use persistence::{DrawingStore, FileNoteStore, ImagePayload, PersistenceError};
pub use renderer::Renderer;
pub use session::{DrawingSession, OpTicket, SaveRequest};
pub use state::EditorState;
pub use surface::PixelSurface;
pub use tools::{BrushSettings, Tool, ToolEngine};
