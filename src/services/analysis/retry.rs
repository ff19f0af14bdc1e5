//! Failure Classification and Backoff
//!
//! `FailureReason` records why a producer contributed nothing.
//! `RetryPolicy` drives the exponential backoff loop used for the consensus
//! producer. Only rate-limited failures are retried.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use iatrikos_llm::LlmError;

use crate::models::settings::{EngineConfig, MAX_CONSENSUS_ATTEMPTS};
use crate::utils::error::AppError;

/// Reasons a producer can degrade to the empty sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Upstream asked us to slow down and retries ran out
    RateLimited,
    /// Upstream failed for any other reason
    UpstreamError,
    /// Upstream answered but the text was unusable
    InvalidResponse,
    /// The producer panicked
    Panicked,
    /// The request was cancelled
    Cancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::RateLimited => write!(f, "rate_limited"),
            FailureReason::UpstreamError => write!(f, "upstream_error"),
            FailureReason::InvalidResponse => write!(f, "invalid_response"),
            FailureReason::Panicked => write!(f, "panicked"),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FailureReason {
    /// Classify a producer error.
    pub fn classify(err: &AppError) -> Self {
        match err {
            AppError::Generation(e) if e.is_rate_limited() => FailureReason::RateLimited,
            AppError::Generation(LlmError::ParseError { .. }) => FailureReason::InvalidResponse,
            AppError::Generation(_) => FailureReason::UpstreamError,
            AppError::Core(_) | AppError::Serialization(_) => FailureReason::InvalidResponse,
            AppError::Cancelled(_) => FailureReason::Cancelled,
            _ => FailureReason::UpstreamError,
        }
    }
}

/// Exponential backoff for rate-limited failures.
///
/// The wait after failed attempt `n` (0-based) is `base_delay * 2^n`, so
/// three attempts wait at most `base + 2*base` in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Attempts are clamped into 1..=3.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_CONSENSUS_ATTEMPTS),
            base_delay,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.consensus_max_attempts,
            Duration::from_millis(config.consensus_base_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after failed attempt `attempt` (0-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Result of a retried operation plus the number of attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
    is_retryable: R,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                }
            }
            Err(err) if is_retryable(&err) && attempt + 1 < policy.max_attempts() => {
                let wait = policy.delay_after(attempt);
                tracing::warn!(
                    operation = label,
                    attempt = attempt + 1,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "rate limited, backing off before retry"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(err) => {
                return RetryOutcome {
                    result: Err(err),
                    attempts: attempt + 1,
                }
            }
        }
    }
}
