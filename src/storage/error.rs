//! Storage collaborator error types
//!
//! Defines all errors that can surface from the catalog, planner and reader.

use thiserror::Error;

/// Message the planner uses when a plan resolves to no stored buckets.
pub const NO_FILES_RETURNED: &str = "No files returned from query parse";

/// Errors that can occur in the storage collaborators
#[derive(Error, Debug)]
pub enum StorageError {
    /// The plan matched no stored bucket
    #[error("No files returned from query parse")]
    NoFilesReturned,

    /// A plan was parsed without any target key
    #[error("Query has no target key")]
    NoTargetKey,

    /// A bucket was referenced that is not stored
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Column layout violated (ragged columns, missing Epoch, type mismatch)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Bucket key or timeframe rejected by the store
    #[error("Invalid bucket: {0}")]
    InvalidBucket(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding failed
    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        StorageError::Csv(err.to_string())
    }
}

impl From<crate::bucket::KeyError> for StorageError {
    fn from(err: crate::bucket::KeyError) -> Self {
        StorageError::InvalidBucket(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
