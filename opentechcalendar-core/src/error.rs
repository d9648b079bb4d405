//! Error types for the import pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while importing a group's events.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Unexpected source format: {0}")]
    Format(String),

    #[error("Could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
