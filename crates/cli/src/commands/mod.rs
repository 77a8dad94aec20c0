//! CLI command implementations.
//!
//! Each module is a thin orchestration over [`StorageService`]: it reads or
//! writes entities, files and messages and reports what it did through
//! `tracing`. Functions return their results so they can be tested against
//! the in-memory backend.
//!
//! [`StorageService`]: abc_retail_storage::StorageService

pub mod customers;
pub mod orders;
pub mod products;
pub mod proofs;
pub mod provision;
pub mod queue;
pub mod stats;

use abc_retail_core::OrderError;
use abc_retail_storage::{ConfigError, StorageError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The request was rejected before reaching storage.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Order could not be constructed.
    #[error("Invalid order: {0}")]
    Order(#[from] OrderError),

    /// Local file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Whether the command was rejected as invalid input, either locally or
    /// by the storage layer.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::Storage(StorageError::InvalidInput(_))
        )
    }
}

/// Result type alias for commands.
pub type CommandResult<T> = Result<T, CommandError>;

/// File name component of a local path, as UTF-8.
fn file_name_of(path: &std::path::Path) -> CommandResult<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CommandError::InvalidInput(format!("{} has no file name", path.display())))
}
