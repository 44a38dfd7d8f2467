//! Error types for diary-core

use thiserror::Error;

use crate::forms::FieldErrors;

/// Result type alias using diary-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in diary-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry (or page) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Form validation failed; carries field-level messages
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session token could not be issued or verified
    #[error("Session error: {0}")]
    Session(String),
}

impl Error {
    /// Whether this error means the target row or page does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
