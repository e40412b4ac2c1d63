//! Execution error types.

use thiserror::Error;

use crate::model::FieldType;
use crate::shape::ShapeError;

/// Result type for report execution.
pub type ExecuteResult<T> = Result<T, ExecutionError>;

/// Report-level failures. Execution is all-or-nothing: none of these
/// variants comes with a partial result.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A row carried a value of the wrong runtime type for a filtered,
    /// grouped, or sorted field.
    #[error("type mismatch for field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    /// An orderBy field is absent from the computed row set.
    #[error("sort field '{0}' is missing from the result rows")]
    MissingSortField(String),

    /// The external row source failed; retryable at the caller's
    /// discretion, the core does not retry.
    #[error("row source failure: {0}")]
    RowSource(#[from] RowSourceError),

    /// The computed rows cannot be shaped into the requested output.
    #[error("cannot shape result: {0}")]
    Shape(#[from] ShapeError),

    /// Cancellation was requested before the report completed.
    #[error("report execution cancelled")]
    Cancelled,
}

/// Failure fetching rows from the external collaborator.
#[derive(Debug, Error)]
pub enum RowSourceError {
    #[error("row source timed out after {0} seconds")]
    Timeout(u64),

    #[error("row source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid row data: {0}")]
    InvalidData(String),

    #[error("row source error: {0}")]
    Other(String),
}
