//! Retry utilities with exponential backoff for provider-internal retries.
//!
//! The discovery engine never retries a provider itself; each provider wraps
//! its own HTTP calls with [`with_retry`].

use std::time::Duration;
use tokio::time::sleep;

use crate::providers::ProviderError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before attempt `attempt + 1`, given the error that ended `attempt`
    fn delay_for(&self, attempt: u32, error: &ProviderError) -> Duration {
        let exp = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt.saturating_sub(1) as f64);
        let backoff = Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()));

        match error {
            ProviderError::RateLimit {
                retry_after: Some(after),
            } => backoff.max(*after).min(self.max_delay),
            _ => backoff,
        }
    }
}

/// Execute an async operation, retrying retriable provider errors with
/// exponential backoff
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Operation succeeded after transient failures");
                }
                return Ok(result);
            }
            Err(error) if error.is_retriable() && attempt < config.max_attempts => {
                let delay = config.delay_for(attempt, &error);
                tracing::debug!(
                    attempt,
                    ?delay,
                    error = %error,
                    "Transient error, retrying"
                );
                sleep(delay).await;
            }
            Err(error) => {
                if error.is_retriable() {
                    tracing::warn!(attempts = attempt, error = %error, "Operation failed after retries");
                }
                return Err(error);
            }
        }
    }
}

/// Retry configuration tuned for public research APIs
pub fn api_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(20),
        backoff_multiplier: 2.0,
    }
}
