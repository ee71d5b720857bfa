//! Error types for issue service operations.

use thiserror::Error;

/// The error type for issue service operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The acting identity is missing or not authorized for the operation.
    #[error("permission denied")]
    PermissionDenied,

    /// The request failed validation before any mutation took place.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced issue, comment, or event does not exist.
    #[error("not found")]
    NotFound,

    /// The acting user already has reactions on the maximum number of
    /// distinct emoji for this comment.
    #[error("too many reactions from the same user (limit {limit})")]
    TooManyReactions {
        /// Distinct-emoji quota per user per comment.
        limit: usize,
    },

    /// The operation is not supported by this storage backend.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Storage read, write, or listing failure, surfaced verbatim.
    #[error("storage error: {0}")]
    Records(brads_records::Error),

    /// A collaborator service (user directory, notifications) failed.
    #[error("external service error: {0}")]
    External(Box<dyn std::error::Error + Send + Sync>),
}

impl From<brads_records::Error> for Error {
    fn from(err: brads_records::Error) -> Self {
        // A missing record is the storage not-found condition, which callers
        // can recover from; everything else is an IO failure.
        if err.is_not_found() {
            Error::NotFound
        } else {
            Error::Records(err)
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::from(brads_records::Error::Io(err))
    }
}

/// A specialized Result type for issue service operations.
pub type Result<T> = std::result::Result<T, Error>;
