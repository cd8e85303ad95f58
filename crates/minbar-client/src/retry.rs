//! Upload retry policy.
//!
//! An explicit policy object: fixed attempt budget, exponential backoff
//! from a base delay, and the retryable-error predicate from
//! [`SubmitError::is_retryable`]. Delays occur strictly between
//! attempts, never after the last one.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use minbar_core::SubmitError;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `attempt + 1`, given `attempt` failures so
    /// far (1s, 2s, 4s, ... for the default base).
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt.saturating_sub(1))
    }

    /// Run `operation` until it succeeds, fails terminally, or the
    /// attempt budget is exhausted. Only retryable errors consume extra
    /// attempts; everything else propagates on first occurrence. The
    /// last-seen error propagates when the budget runs out.
    pub async fn run<T, F, Fut>(&self, name: &str, mut operation: F) -> Result<T, SubmitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SubmitError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        operation = name,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Operation failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        operation = name,
                        attempt,
                        error = %err,
                        "Operation failed terminally"
                    );
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn failing_then_ok(failures: u32) -> (Arc<AtomicU32>, impl FnMut() -> FutBox) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let op = move || -> FutBox {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n < failures {
                    Err(SubmitError::Connectivity("refused".into()))
                } else {
                    Ok(n + 1)
                }
            })
        };
        (calls, op)
    }

    type FutBox =
        std::pin::Pin<Box<dyn Future<Output = Result<u32, SubmitError>> + Send>>;

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_success_takes_three_attempts() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        let (calls, op) = failing_then_ok(2);

        let result = policy.run("test", op).await.unwrap();
        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_has_no_trailing_delay() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        let (calls, op) = failing_then_ok(10);

        let err = policy.run("test", op).await.unwrap_err();
        assert!(matches!(err, SubmitError::Connectivity(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Delays only between attempts: 1s + 2s, never the 4s after the
        // last failure
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = policy
            .run("test", move || -> FutBox {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Err(SubmitError::PayloadTooLarge("25 MB".into())) })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::PayloadTooLarge(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_immediate_success_sleeps_never() {
        let policy = RetryPolicy::default();
        let (calls, op) = failing_then_ok(0);
        let result = policy.run("test", op).await.unwrap();
        assert_eq!(result, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
