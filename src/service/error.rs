//! Service error types
//!
//! Every failure a query-class operation can report, composed from the
//! lower layers' errors.

use crate::bucket::KeyError;
use crate::pipeline::PipelineError;
use crate::query::QueryError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors returned by [`DataService`](crate::service::DataService) operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Destination failed to parse or validate
    #[error("{0}")]
    Validation(#[from] KeyError),

    /// SQL statement failed to parse or validate
    #[error("{0}")]
    Parse(String),

    /// The readiness gate is closed
    #[error("not ready")]
    NotReady,

    /// Operation invoked without arguments
    #[error("Missing args")]
    MissingArgs,

    /// Aggregate chain failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The plan matched no stored data
    #[error("No files returned from query parse")]
    EmptyResult,

    /// Result shaping or SQL materialization failed
    #[error("{0}")]
    Execution(String),

    /// Storage collaborator failed
    #[error(transparent)]
    Storage(StorageError),
}

impl ServiceError {
    /// Whether this is the empty-result condition rather than a hard failure
    pub fn is_empty_result(&self) -> bool {
        matches!(self, ServiceError::EmptyResult)
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NoFilesReturned => ServiceError::EmptyResult,
            other => ServiceError::Storage(other),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Parse(_) | QueryError::InvalidAggregation(_) => {
                ServiceError::Parse(err.to_string())
            }
            QueryError::Key(e) => ServiceError::Validation(e),
            QueryError::Storage(e) => ServiceError::Storage(e),
            QueryError::Execution(_) => ServiceError::Execution(err.to_string()),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
