//! Retry utilities for calls to external services.
//!
//! The caller's error type decides what is transient through [`Retryable`];
//! everything else is returned on the first failure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for retry behavior: a bounded number of retries with the
/// same delay before each one.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Delay before every retry.
    pub delay: Duration,
}

impl RetryConfig {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Total number of calls this config allows, initial attempt included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Errors that know whether repeating the call may succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Execute a call with retry logic.
///
/// Retries only while `is_retryable()` holds and the budget allows; the last
/// error is returned once either runs out.
///
/// # Example
/// ```ignore
/// let text = retry_call(&RetryConfig::fixed(2, Duration::from_secs(2)), "generate", || async {
///     provider.generate(&file, &prompt).await
/// })
/// .await?;
/// ```
pub async fn retry_call<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    f: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_retryable() {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        error = %err,
                        "Call failed with non-retryable error"
                    );
                    return Err(err);
                }

                if attempt >= config.max_retries {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        error = %err,
                        "Call failed after max retries"
                    );
                    return Err(err);
                }

                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    error = %err,
                    delay_ms = config.delay.as_millis() as u64,
                    "Call failed, retrying after delay"
                );

                sleep(config.delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    #[test]
    fn test_fixed_config_counts_initial_attempt() {
        let config = RetryConfig::fixed(2, Duration::from_secs(2));
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let config = RetryConfig::fixed(2, Duration::ZERO);
        let result = retry_call(&config, "test_op", || async { Ok::<_, TestError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let config = RetryConfig::fixed(2, Duration::ZERO);

        let result = retry_call(&config, "test_op", move || async move {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(TestError::Transient),
                n => Ok(n),
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let config = RetryConfig::fixed(2, Duration::ZERO);

        let result = retry_call(&config, "test_op", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<u32, _>(TestError::Fatal)
        })
        .await;

        assert_eq!(result.unwrap_err(), TestError::Fatal);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let config = RetryConfig::fixed(2, Duration::ZERO);

        let result = retry_call(&config, "test_op", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<u32, _>(TestError::Transient)
        })
        .await;

        assert_eq!(result.unwrap_err(), TestError::Transient);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_makes_single_call() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let _ = retry_call(&RetryConfig::fixed(0, Duration::ZERO), "test_op", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<u32, _>(TestError::Transient)
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
