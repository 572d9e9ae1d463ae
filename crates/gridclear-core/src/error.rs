//! Validation and input errors for market cases
//!
//! Everything in this module is raised before a model is built. None of these
//! errors is retryable: the case data has to change.

use thiserror::Error;

/// Error type for case loading and validation.
#[derive(Error, Debug)]
pub enum CaseError {
    /// Asymmetric, negative, non-finite or mis-shaped network matrices
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Bad participant bounds, prices or location
    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O errors while reading case files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using CaseError.
pub type CaseResult<T> = Result<T, CaseError>;

impl From<serde_json::Error> for CaseError {
    fn from(err: serde_json::Error) -> Self {
        CaseError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for CaseError {
    fn from(err: toml::de::Error) -> Self {
        CaseError::Parse(err.to_string())
    }
}
