//! Retry with exponential backoff for recoverable errors
//!
//! This module repeats a single external call when it fails with a
//! retryable error, sleeping a jittered exponential delay in between.
//! Retries never change the request; regeneration with different model
//! parameters is the orchestrator's concern.

use std::fmt;
use std::future::Future;

use super::backoff::{BackoffCalculator, BackoffConfig};
use crate::error::Result;
use crate::util::{lock, SharedRng};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 means no retries)
    pub max_retries: u32,

    /// Delay policy between attempts
    pub backoff: BackoffConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: BackoffConfig::default(),
        }
    }
}

impl fmt::Display for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryConfig {{ max_retries: {}, backoff: {} }}",
            self.max_retries, self.backoff
        )
    }
}

/// Executor for retry operations with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
    backoff: BackoffCalculator,
}

impl RetryExecutor {
    /// Create a new retry executor with the specified configuration
    pub fn new(config: RetryConfig) -> Self {
        let backoff = BackoffCalculator::new(config.backoff.clone());
        Self { config, backoff }
    }

    /// Execute a fallible operation with retries according to the configuration
    pub async fn execute<F, Fut, T>(&self, rng: &SharedRng, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retries < self.config.max_retries => {
                    retries += 1;
                    let delay = {
                        let mut rng = lock(rng);
                        self.backoff.delay(retries, &mut *rng)
                    };

                    log::warn!(
                        "Call failed with retryable error, retrying in {:?} (retry {}/{}): {}",
                        delay,
                        retries,
                        self.config.max_retries,
                        err
                    );

                    tokio::time::sleep(delay).await;
                }
                Err(err) if retries > 0 => {
                    return Err(err.with_context_value("retries", retries));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Get the current retry configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn backoff(&self) -> &BackoffCalculator {
        &self.backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::util::seeded_rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            backoff: BackoffConfig {
                base_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(20),
                min_delay: Duration::from_millis(1),
                jitter_factor: 0.25,
            },
        }
    }

    #[tokio::test]
    async fn test_successful_operation() {
        let retry = RetryExecutor::new(fast_config(2));
        let result = retry
            .execute(&seeded_rng(1), || async { Ok::<_, GenerationError>(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_on_failure() {
        let attempts = AtomicUsize::new(0);
        let retry = RetryExecutor::new(fast_config(2));

        let result = retry
            .execute(&seeded_rng(1), || async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(GenerationError::network("Test failure"))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_non_retryable_error() {
        let attempts = AtomicUsize::new(0);
        let retry = RetryExecutor::new(fast_config(3));

        let result: Result<()> = retry
            .execute(&seeded_rng(1), || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(GenerationError::authentication("Invalid API key"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_max_retries_exceeded() {
        let attempts = AtomicUsize::new(0);
        let retry = RetryExecutor::new(fast_config(2));

        let result: Result<()> = retry
            .execute(&seeded_rng(1), || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(GenerationError::server("Persistent failure"))
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Server);
        assert_eq!(attempts.load(Ordering::SeqCst), 3); // Initial + 2 retries
    }
}
