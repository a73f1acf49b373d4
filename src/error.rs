use thiserror::Error;

use crate::persistence::PersistenceError;

/// Errors raised by the drawing subsystem.
///
/// Every variant is local to the operation that produced it. The surface and
/// history are left as they were before the failing call.
#[derive(Debug, Error)]
pub enum DrawingError {
    /// A surface was requested with a zero width or height
    #[error("invalid surface dimensions {width}x{height}")]
    InvalidDimension { width: i64, height: i64 },

    /// Stored image or history snapshot bytes could not be decoded
    #[error("could not load drawing: {0}")]
    DecodeError(String),

    /// The surface could not be encoded to PNG
    #[error("could not encode drawing: {0}")]
    EncodeError(String),

    /// A save or load is already in flight for this editor
    #[error("a save or load is already in progress")]
    Busy,

    /// The storage collaborator rejected a save or load
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl DrawingError {
    /// True when the user can retry the same operation without losing work.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Result type for drawing operations
pub type DrawingResult<T> = Result<T, DrawingError>;
