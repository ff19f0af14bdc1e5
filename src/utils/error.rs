//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use iatrikos_core::CoreError;
use iatrikos_llm::LlmError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Case model and parsing errors
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Generation provider failures
    #[error("Generation error: {0}")]
    Generation(#[from] LlmError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Another analysis of the same case has not finished yet
    #[error("Analysis already in flight for case {0}")]
    AnalysisInFlight(String),

    /// The request was cancelled or ran past its deadline
    #[error("Analysis cancelled: {0}")]
    Cancelled(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a cancelled error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The generation failure behind this error, if any.
    pub fn as_generation(&self) -> Option<&LlmError> {
        match self {
            AppError::Generation(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.as_generation().is_some_and(LlmError::is_rate_limited)
    }
}

/// Convert AppError to a string for display at the CLI boundary
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
