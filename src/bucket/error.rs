//! Bucket key error types

use thiserror::Error;

/// Errors raised while parsing, validating or canonicalizing a bucket key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key string could not be split into items and categories
    #[error("Unable to parse bucket key {key}: {reason}")]
    Parse { key: String, reason: String },

    /// A destination is missing a required category or carries too many items
    #[error("{0}")]
    Validation(String),

    /// Timeframe string not understood or not materialized
    #[error("Timeframe error: {0}")]
    Timeframe(String),
}

/// Result type for bucket key operations
pub type KeyResult<T> = Result<T, KeyError>;
