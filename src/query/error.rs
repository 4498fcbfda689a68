//! SQL error types
//!
//! Defines all error conditions that can occur while parsing, validating and
//! materializing a SQL statement.

use thiserror::Error;

/// Errors that can occur during SQL operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// Statement text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Aggregates mixed with plain columns, or applied to `*`
    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),

    /// Statement failed while reading or shaping results
    #[error("Execution error: {0}")]
    Execution(String),

    /// FROM clause did not name a valid bucket
    #[error("Invalid bucket: {0}")]
    Key(#[from] crate::bucket::KeyError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for SQL operations
pub type QueryResult<T> = Result<T, QueryError>;
