//! Generation Provider Trait
//!
//! Defines the common interface for all text-generation providers.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{LlmError, LlmResult, ProviderConfig, ProviderType};
use crate::gemini::GeminiProvider;
use crate::openai::OpenAIProvider;

/// Trait that all generation providers must implement.
///
/// The analysis pipeline only needs one operation: turn a prompt into text.
/// Providers map transport and status failures onto `LlmError` so callers
/// can tell a rate limit apart from everything else.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> LlmResult<String>;

    /// Check if the provider is reachable with the configured key.
    async fn health_check(&self) -> LlmResult<()> {
        self.generate("ping").await.map(|_| ())
    }
}

/// Build the provider selected by `config.provider`.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn GenerationProvider>> {
    let provider: Arc<dyn GenerationProvider> = match config.provider {
        ProviderType::Gemini => Arc::new(GeminiProvider::new(config)?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config)?),
    };
    Ok(provider)
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    // Gemini reports quota exhaustion in the body, sometimes without a 429.
    if body.contains("RESOURCE_EXHAUSTED") {
        return LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        };
    }

    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

/// Read a `Retry-After` header value in seconds.
pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u32> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u32>().ok())
}

/// Attach a `Retry-After` value to a rate-limit error.
pub(crate) fn with_retry_after(err: LlmError, retry_after: Option<u32>) -> LlmError {
    match err {
        LlmError::RateLimited { message, .. } => LlmError::RateLimited {
            message,
            retry_after,
        },
        other => other,
    }
}
