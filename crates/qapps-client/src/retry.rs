use std::future::Future;
use std::time::Duration;

use qapps_core::RetrySettings;
use tokio::time::sleep;

use crate::error::{ApiResult, FailedCall};

/// Bounded retry with exponential backoff for retryable API failures.
///
/// Authorization failures and other non-retryable kinds return after the
/// first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            settings.initial_backoff(),
            settings.max_backoff(),
        )
    }

    /// Policy that never retries and never sleeps
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt following `attempt` (1-based), capped at `max_backoff`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T, FailedCall>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff_for(attempt);
                    tracing::debug!(
                        operation = error.operation,
                        kind = error.kind.as_str(),
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying API call"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(FailedCall {
                        error,
                        attempts: attempt,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiErrorKind};
    use std::cell::Cell;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500), Duration::from_secs(3));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff_for(4), Duration::from_secs(3));
        assert_eq!(policy.backoff_for(40), Duration::from_secs(3));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(instant_policy(0).max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = Cell::new(0);
        let result = instant_policy(3)
            .run(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(ApiError::new(ApiErrorKind::Throttled, "GetLibraryItem", "slow"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let calls = Cell::new(0);
        let result: Result<(), _> = instant_policy(3)
            .run(|| {
                calls.set(calls.get() + 1);
                async { Err(ApiError::new(ApiErrorKind::Transient, "GetLibraryItem", "reset")) }
            })
            .await;
        let failed = result.unwrap_err();
        assert_eq!(failed.attempts, 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_unauthorized() {
        let calls = Cell::new(0);
        let result: Result<(), _> = instant_policy(5)
            .run(|| {
                calls.set(calls.get() + 1);
                async {
                    Err(ApiError::new(
                        ApiErrorKind::Unauthorized,
                        "GetLibraryItem",
                        "user-level only",
                    ))
                }
            })
            .await;
        let failed = result.unwrap_err();
        assert!(failed.error.is_unauthorized());
        assert_eq!(failed.attempts, 1);
        assert_eq!(calls.get(), 1);
    }
}
