//! Error types for capeseq

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for capeseq operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("malformed data: {0}")]
    MalformedData(String),

    #[error("shape mismatch: expected {expected} vertices, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for capeseq operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Convenience constructor for a missing file or directory.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound { path: path.into() }
    }
}
