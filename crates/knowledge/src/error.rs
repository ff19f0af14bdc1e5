//! Knowledge Lookup Errors
//!
//! These errors never leave the crate's `KnowledgeLookup` implementations:
//! they are logged and turned into empty results at the trait boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    /// Transport failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status from a reference service
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    /// Payload did not have the expected shape
    #[error("Malformed {service} payload: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    /// Configured endpoint is not a valid URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

impl KnowledgeError {
    pub fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            service,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for KnowledgeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<url::ParseError> for KnowledgeError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<KnowledgeError> for String {
    fn from(err: KnowledgeError) -> String {
        err.to_string()
    }
}
