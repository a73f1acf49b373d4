//! Storage collaborator consumed by the drawing editor.
//!
//! The editor only hands over encoded images and receives them back; note
//! bookkeeping belongs to the store.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::document::{Note, NoteId};

mod file_store;
pub use file_store::FileNoteStore;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Errors that can occur while saving or loading drawings
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to write drawing data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize notes: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Drawing file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    #[error("Storage task ended without a result")]
    Cancelled,
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Encoded image bytes (PNG) travelling between the editor and the store
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_data_url(&self) -> String {
        format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(&self.bytes))
    }

    /// Accepts `data:image/png;base64,...` or bare base64.
    pub fn from_data_url(url: &str) -> PersistenceResult<Self> {
        let encoded = url.strip_prefix(PNG_DATA_URL_PREFIX).unwrap_or(url);
        if encoded.starts_with("data:") {
            return Err(PersistenceError::InvalidPayload(
                "only PNG data URLs are supported".to_owned(),
            ));
        }
        STANDARD
            .decode(encoded.trim())
            .map(Self::new)
            .map_err(|err| PersistenceError::InvalidPayload(err.to_string()))
    }
}

/// Note storage as seen by the drawing editor.
///
/// Both operations may block on disk, so they are futures the host runs off
/// the UI thread.
pub trait DrawingStore: Send + Sync {
    /// Stores the image and attaches it to `target`, or to a new note when
    /// `target` is `None`. Resolves to the saved note.
    fn save_drawing(
        &self,
        payload: ImagePayload,
        target: Option<NoteId>,
        title: String,
    ) -> BoxFuture<'static, PersistenceResult<Note>>;

    /// Reads back an image previously returned as a note's `drawing_path`.
    fn load_drawing_image(&self, reference: &Path) -> BoxFuture<'static, PersistenceResult<ImagePayload>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trip() {
        let payload = ImagePayload::new(vec![0x89, b'P', b'N', b'G', 0, 1, 2]);
        let url = payload.to_data_url();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(ImagePayload::from_data_url(&url).unwrap(), payload);
    }

    #[test]
    fn foreign_data_urls_are_rejected() {
        assert!(matches!(
            ImagePayload::from_data_url("data:image/jpeg;base64,AAAA"),
            Err(PersistenceError::InvalidPayload(_))
        ));
        assert!(ImagePayload::from_data_url("%%%").is_err());
    }
}
