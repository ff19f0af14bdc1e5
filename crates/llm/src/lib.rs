//! Iatrikos LLM
//!
//! Provides a unified interface for the text-generation services used by the
//! analysis pipeline:
//! - Google Gemini (generateContent)
//! - OpenAI and OpenAI-compatible chat completions
//!
//! Also includes the HTTP client factory and the shared error taxonomy.

pub mod gemini;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::{create_provider, missing_api_key_error, parse_http_error, GenerationProvider};
pub use types::*;
