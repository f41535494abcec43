//! Error types for the storage crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by catalog and registry lookups.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse registry {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No delivery of '{name}' with id '{delivery_id}'")]
    UnknownDelivery { name: String, delivery_id: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
