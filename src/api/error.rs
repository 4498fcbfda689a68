//! API Error Types
//!
//! Maps service failures onto HTTP responses.

use crate::pipeline::PipelineError;
use crate::service::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// A data service operation failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Request body is not valid JSON for the route
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// HTTP status and stable error code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Service(e) => match e {
                ServiceError::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY"),
                ServiceError::MissingArgs => (StatusCode::BAD_REQUEST, "MISSING_ARGS"),
                ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                ServiceError::Parse(_) => (StatusCode::BAD_REQUEST, "PARSE_ERROR"),
                ServiceError::Pipeline(p) => match p {
                    PipelineError::UnknownFunction(_) => {
                        (StatusCode::BAD_REQUEST, "REGISTRY_ERROR")
                    }
                    PipelineError::UnparsableCall(_)
                    | PipelineError::UnclosedLiteral(_)
                    | PipelineError::ArgumentMapping { .. }
                    | PipelineError::InitArguments { .. } => {
                        (StatusCode::BAD_REQUEST, "ARGUMENT_ERROR")
                    }
                    PipelineError::NoResult(_) | PipelineError::Execution(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_ERROR")
                    }
                },
                ServiceError::EmptyResult => (StatusCode::NOT_FOUND, "EMPTY_RESULT"),
                ServiceError::Execution(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "EXECUTION_ERROR")
                }
                ServiceError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::info!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
