//! Bounded exponential-backoff retry for upstream mutations.
//!
//! Only stock reconciliation goes through this policy; reads degrade to
//! fallback data instead, and order creation is not idempotent so it is
//! never retried automatically.

use std::time::Duration;

use thiserror::Error;

/// Raised after the retry budget is exhausted, distinct from the
/// underlying cause (which it records as its source).
#[derive(Debug, Error)]
#[error("operation failed after {attempts} attempts")]
pub struct RetryExhausted<E: std::error::Error + 'static> {
    pub attempts: u32,
    #[source]
    pub last_error: E,
}

/// Retry policy: up to `max_attempts` tries, sleeping
/// `2^attempt * base_delay` after the attempt numbered `attempt`
/// (0-based). With the defaults that is 1s then 2s.
#[derive(Debug, Clone, Copy)]
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
    /// Run `op` under this policy.
    ///
    /// The backoff sleep is a plain `tokio::time::sleep`, so dropping the
    /// future (request aborted) cancels the wait with it.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] wrapping the final attempt's error once
    /// the budget is spent.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        E: std::error::Error + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "retried operation failed");
                    last_error = Some(e);
                }
            }

            if attempt + 1 < attempts {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }

        // attempts >= 1, so at least one error was recorded.
        #[allow(clippy::unwrap_used)]
        Err(RetryExhausted {
            attempts,
            last_error: last_error.unwrap(),
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, Error)]
    #[error("transient")]
    struct Transient;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_with_geometric_sleeps() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = RetryPolicy::default()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 { Err(Transient) } else { Ok(n) }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Paused clock: exactly the 1s + 2s backoff sleeps elapsed.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_exactly_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Transient) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_no_sleep_on_immediate_success() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
        };
        let result: Result<i32, RetryExhausted<Transient>> =
            policy.run(|| async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }
}
