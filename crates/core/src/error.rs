//! Core Error Types
//!
//! Defines the foundational error types used across the Iatrikos workspace.
//! These error types are dependency-light (only thiserror + serde_json) so the
//! core crate stays free of network and runtime dependencies.
//!
//! The application crate extends these with variants for configuration,
//! storage and the generation provider.

use thiserror::Error;

/// Core error type for the Iatrikos workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Case validation errors (malformed input)
    #[error("Invalid case: {0}")]
    InvalidCase(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generated text could not be read as the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create an invalid case error
    pub fn invalid_case(msg: impl Into<String>) -> Self {
        Self::InvalidCase(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
