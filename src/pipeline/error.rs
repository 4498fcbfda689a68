//! Aggregate pipeline error types

use thiserror::Error;

/// Failure binding call parameters to an aggregate's declared arguments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("need {required} arguments, have {available}")]
    TooFew { required: usize, available: usize },

    #[error("accepts at most {max} arguments, have {available}")]
    TooMany { max: usize, available: usize },
}

/// Errors raised while parsing or running an aggregate call chain
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Call text has no `(`, no `)`, or they are out of order
    #[error("unable to parse function call {0}")]
    UnparsableCall(String),

    /// A quoted literal was opened but never closed
    #[error("unclosed literal {0}")]
    UnclosedLiteral(String),

    /// No aggregate registered under the call's name
    #[error("No function in the UDA Registry named \"{0}\"")]
    UnknownFunction(String),

    /// Parameters could not be bound to the aggregate's argument map
    #[error("Argument mapping error for {function}: {reason}")]
    ArgumentMapping {
        function: String,
        reason: ArgumentError,
    },

    /// Fewer init literals than the aggregate declares
    #[error("Not enough init arguments for {function}, need {required} have {available}")]
    InitArguments {
        function: String,
        required: usize,
        available: usize,
    },

    /// The aggregate produced no output
    #[error("No result from aggregate {0}")]
    NoResult(String),

    /// An aggregate failed while initializing or accumulating
    #[error("{0}")]
    Execution(String),
}

impl From<crate::storage::StorageError> for PipelineError {
    fn from(err: crate::storage::StorageError) -> Self {
        PipelineError::Execution(err.to_string())
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PipelineError::UnknownFunction("Nope".to_string());
        assert_eq!(err.to_string(), "No function in the UDA Registry named \"Nope\"");

        let err = PipelineError::InitArguments {
            function: "EMA".to_string(),
            required: 2,
            available: 1,
        };
        assert_eq!(err.to_string(), "Not enough init arguments for EMA, need 2 have 1");

        let err = PipelineError::ArgumentMapping {
            function: "Resample".to_string(),
            reason: ArgumentError::TooFew {
                required: 4,
                available: 2,
            },
        };
        assert_eq!(
            err.to_string(),
            "Argument mapping error for Resample: need 4 arguments, have 2"
        );
    }
}
