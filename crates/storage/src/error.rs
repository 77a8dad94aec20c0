//! Storage-layer errors.
//!
//! Every failure is surfaced to the caller as a typed [`StorageError`]. This
//! layer performs no retries and no silent recovery.

use thiserror::Error;

use crate::connection::ConnectionStringError;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Requested entity, object, queue, share, directory or file is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected before or by the backend as malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Concurrent-write version mismatch, or a conflicting resource state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transport, authentication, throttling or server failure.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Data in the backend could not be decoded into the requested shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The storage account could not be configured.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConnectionStringError),
}

impl StorageError {
    /// Whether this error means the requested resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error is a version mismatch or conflicting state.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

/// Result type alias for `StorageError`.
pub type Result<T> = std::result::Result<T, StorageError>;
