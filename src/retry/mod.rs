//! Bounded retry with exponential backoff
//!
//! Retryability is decided by the error itself ([`AdapterError::is_retryable`]),
//! which is fixed when the error is classified. The policy only counts attempts
//! and sleeps between them.

use crate::config::RetryConfig;
use crate::error::{AdapterError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy wrapping a single asynchronous network operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    multiplier: Duration,
    min_wait: Duration,
    max_wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, multiplier: Duration, min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier,
            min_wait,
            max_wait,
        }
    }

    /// Policy tuned for the embeddings endpoint (3 attempts, 4s..60s)
    pub fn embedding() -> Self {
        Self::from_config(&RetryConfig::embedding())
    }

    /// Policy tuned for the chat endpoint (3 attempts, 4s..10s)
    pub fn chat() -> Self {
        Self::from_config(&RetryConfig::chat())
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            seconds(config.multiplier_secs),
            seconds(config.min_wait_secs),
            seconds(config.max_wait_secs),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before the next attempt, after `attempt` attempts have failed
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30);
        let raw = self.multiplier.checked_mul(1 << exponent).unwrap_or(Duration::MAX);
        raw.max(self.min_wait).min(self.max_wait)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. The last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match call().await {
                Ok(value) => {
                    debug!("{} succeeded on attempt {}", operation, attempt);
                    return Ok(value);
                }
                Err(e) if should_retry(&e) && attempt < self.max_attempts => {
                    let wait = self.backoff(attempt);
                    warn!(
                        "{} failed on attempt {}/{}: {}; retrying in {:?}",
                        operation, attempt, self.max_attempts, e, wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    if should_retry(&e) {
                        warn!("{} giving up after {} attempts: {}", operation, attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Seconds from config as a `Duration`: negative or NaN is zero, too large saturates
fn seconds(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn should_retry(err: &AdapterError) -> bool {
    err.is_retryable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifiedError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn immediate() -> RetryPolicy {
        RetryPolicy::from_config(&RetryConfig::immediate(3))
    }

    #[test]
    fn test_embedding_backoff_schedule() {
        let policy = RetryPolicy::embedding();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(8));
        assert_eq!(policy.backoff(7), Duration::from_secs(60));
    }

    #[test]
    fn test_chat_backoff_ceiling() {
        let policy = RetryPolicy::chat();
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(5), Duration::from_secs(10));
        assert_eq!(policy.backoff(40), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_retryable_error_exhausts_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = immediate()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClassifiedError::rate_limited("busy").into())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("busy"));
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_fast() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = immediate()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClassifiedError::auth_failed("bad key").into())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);

        let result = immediate()
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(ClassifiedError::malformed("empty content").into())
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_last_error_is_returned() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = immediate()
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(ClassifiedError::server_transient(format!("attempt {}", n)).into())
            })
            .await;

        assert!(result.unwrap_err().to_string().contains("attempt 2"));
    }

    #[test]
    fn test_unbounded_waits_saturate() {
        let config = RetryConfig {
            max_attempts: 3,
            multiplier_secs: 1e300,
            min_wait_secs: f64::NAN,
            max_wait_secs: f64::INFINITY,
        };
        let policy = RetryPolicy::from_config(&config);

        assert_eq!(policy.backoff(1), Duration::MAX);
        assert_eq!(policy.backoff(31), Duration::MAX);

        let config = RetryConfig {
            multiplier_secs: -1.0,
            ..RetryConfig::chat()
        };
        assert_eq!(RetryPolicy::from_config(&config).backoff(1), Duration::from_secs(4));
    }

    #[test]
    fn test_large_multiplier_does_not_overflow() {
        let policy = RetryPolicy::new(3, Duration::from_secs(u64::MAX / 2), Duration::ZERO, Duration::from_secs(60));
        assert_eq!(policy.backoff(5), Duration::from_secs(60));
    }

    #[test]
    fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);

        let result: Result<u32> = tokio_test::block_on(immediate().run("test", || async {
            Ok(calls.fetch_add(1, Ordering::SeqCst) + 7)
        }));

        assert_eq!(tokio_test::assert_ok!(result), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
