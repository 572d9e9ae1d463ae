//! Error types for the solver boundary.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while handing a problem to an LP backend.
///
/// Infeasible and unbounded outcomes are not errors here: they come back as
/// an [`LpStatus`](crate::LpStatus) on a successful call.
#[derive(Debug, Error)]
pub enum SolverError {
    /// No backend registered under this id.
    #[error("Unknown solver backend: {0}")]
    UnknownBackend(String),

    /// The problem description is malformed (bad ids, NaN coefficients).
    #[error("Invalid LP problem: {0}")]
    InvalidProblem(String),

    /// The backend failed for reasons unrelated to the model.
    #[error("Solver backend {backend} failed: {message}")]
    Backend { backend: String, message: String },

    /// The solve did not finish inside its time limit.
    #[error("Solver timed out after {0:?}")]
    Timeout(Duration),

    /// The caller aborted the solve.
    #[error("Solve cancelled by caller")]
    Cancelled,
}

impl SolverError {
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        SolverError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = SolverError::backend("clarabel", "numerical trouble");
        assert_eq!(
            err.to_string(),
            "Solver backend clarabel failed: numerical trouble"
        );
    }

    #[test]
    fn test_timeout_display_includes_limit() {
        let err = SolverError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }
}
