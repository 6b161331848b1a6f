//! Error types for the ILS-TSP solver.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SolverResult<T> = Result<T, SolverError>;

/// Errors raised when building instances or writing results.
///
/// The search itself never fails: every precondition is checked when the
/// cost matrix, the generator and the configuration are constructed.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A run parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The cost matrix does not describe a symmetric TSP instance.
    #[error("invalid cost matrix: {0}")]
    InvalidMatrix(String),

    /// An instance file could not be parsed.
    #[error("instance parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SolverError {
    pub fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        SolverError::InvalidParameter { name, reason: reason.into() }
    }

    pub fn matrix(message: impl Into<String>) -> Self {
        SolverError::InvalidMatrix(message.into())
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        SolverError::Parse { line, message: message.into() }
    }
}
