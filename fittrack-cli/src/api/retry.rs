use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;

use super::ApiError;

/// Errors that can tell whether another attempt may succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        ApiError::is_retryable(self)
    }
}

/// Retry configuration with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_retries: 1,
            ..Self::default()
        }
    }

    /// Execute a function, retrying transient failures with exponential backoff.
    /// Permanent failures are returned immediately.
    pub async fn execute<F, Fut, T, E>(&self, mut func: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut attempt = 0;
        let mut delay_ms = self.initial_delay_ms;

        loop {
            match func().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;

                    if !e.is_retryable() {
                        return Err(e);
                    }

                    if attempt >= self.max_retries {
                        tracing::warn!("Max retries ({}) exceeded", self.max_retries);
                        return Err(e);
                    }

                    tracing::debug!("Attempt {} failed, retrying in {}ms: {}", attempt, delay_ms, e);

                    sleep(Duration::from_millis(delay_ms)).await;

                    // Exponential backoff with cap
                    delay_ms = ((delay_ms as f64 * self.backoff_factor) as u64).min(self.max_delay_ms);
                }
            }
        }
    }
}
