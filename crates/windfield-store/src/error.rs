//! Error types for windfield and hazard storage.

use thiserror::Error;

/// Errors that can occur while reading realization stores or writing the
/// hazard output store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open a store.
    #[error("failed to open store: {0}")]
    OpenFailed(String),

    /// Failed to read windfield data.
    #[error("failed to read windfield data: {0}")]
    ReadFailed(String),

    /// Failed to write hazard data.
    #[error("failed to write hazard data: {0}")]
    WriteFailed(String),

    /// Invalid or missing store metadata.
    #[error("invalid store metadata: {0}")]
    InvalidMetadata(String),

    /// Underlying storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),
}

impl StoreError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create a WriteFailed error.
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create a StorageError.
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
