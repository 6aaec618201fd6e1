//! Retry logic with exponential backoff and jitter.
//!
//! The delay before retry `n` (n >= 1) is
//! `min(base * 2^(n-1) + jitter, max_delay)` with jitter drawn uniformly from
//! `[0, max_jitter]`. Only errors flagged `retryable` are retried.

use crate::cancel::CancellationToken;
use crate::config::NetworkConfig;
use crate::error::HttpError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Number of retries after the first attempt.
    pub retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay cap, jitter included.
    pub max_delay: Duration,
    /// Upper bound of the additive random jitter.
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: NetworkConfig::MAX_RETRIES,
            base_delay: NetworkConfig::RETRY_BASE_DELAY,
            max_delay: NetworkConfig::RETRY_MAX_DELAY,
            max_jitter: NetworkConfig::RETRY_MAX_JITTER,
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of retries.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the maximum delay cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the jitter upper bound (zero disables jitter).
    pub fn with_max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Calculate the delay slept before retry number `attempt` (1-indexed).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let backoff = self
            .base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay);

        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };

        backoff.saturating_add(jitter).min(self.max_delay)
    }
}

/// Statistics about a retry operation.
#[derive(Debug, Clone, Default)]
pub struct RetryStats {
    /// Number of attempts made.
    pub attempts: u32,
    /// Total delay accumulated.
    pub total_delay: Duration,
    /// Whether the operation ultimately succeeded.
    pub success: bool,
    /// Last error message if failed.
    pub last_error: Option<String>,
}

/// Retry an async HTTP operation with exponential backoff.
///
/// The operation receives the 0-indexed attempt number. Non-retryable errors
/// return immediately; when attempts run out the last error is returned.
/// Cancellation during a backoff sleep aborts with a non-retryable error.
pub async fn retry_async<F, Fut, T>(
    config: &RetryConfig,
    cancel: Option<&CancellationToken>,
    mut operation: F,
) -> (Result<T, HttpError>, RetryStats)
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, HttpError>>,
{
    let mut stats = RetryStats::default();
    let mut last_error: Option<HttpError> = None;
    let max_attempts = config.max_attempts();

    for attempt in 0..max_attempts {
        if attempt > 0 {
            let delay = config.calculate_delay(attempt);
            stats.total_delay += delay;
            if let Some(err) = &last_error {
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt, max_attempts, err, delay
                );
            }
            if !sleep_or_cancel(delay, cancel).await {
                let err = HttpError::network("request cancelled during backoff", false);
                stats.last_error = Some(err.to_string());
                return (Err(err), stats);
            }
        }

        stats.attempts = attempt + 1;

        match operation(attempt).await {
            Ok(value) => {
                stats.success = true;
                if attempt > 0 {
                    debug!("Operation succeeded after {} attempts", attempt + 1);
                }
                return (Ok(value), stats);
            }
            Err(e) => {
                stats.last_error = Some(e.to_string());
                if !e.retryable {
                    debug!("Error is not retryable: {}", e);
                    return (Err(e), stats);
                }
                last_error = Some(e);
            }
        }
    }

    let err = last_error
        .unwrap_or_else(|| HttpError::network("request failed without a recorded error", false));
    warn!(
        "All {} attempts exhausted. Last error: {}",
        max_attempts, err
    );
    (Err(err), stats)
}

/// Sleep for `delay`; returns false if the token fired first.
async fn sleep_or_cancel(delay: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(token) => {
            tokio::select! {
                _ = tokio::time::sleep(delay) => true,
                _ = token.cancelled() => false,
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}
