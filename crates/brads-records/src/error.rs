//! Error types for brads-records operations.

use std::io;
use thiserror::Error;

/// The error type for brads-records operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Reports whether this error is the underlying storage's not-found
    /// condition, so callers can surface a missing record distinctly from
    /// other IO failures.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(err) if err.kind() == io::ErrorKind::NotFound)
    }
}

/// A specialized Result type for brads-records operations.
pub type Result<T> = std::result::Result<T, Error>;
