//! Retry with exponential backoff, independent of any provider error type.
//!
//! A [`RetryPolicy`] owns the mechanics (attempt budget, doubling delay); the
//! caller supplies a classifier that says whether a given failure is worth
//! another attempt.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// What the classifier decided about a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

/// The last error observed plus how many attempts were made.
#[derive(Debug)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
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
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Sleep taken before the 1-based `attempt`: zero for the first,
    /// `base * 2^(attempt - 2)` afterwards.
    ///
    /// ```
    /// use briefly_llm::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let p = RetryPolicy::default();
    /// assert_eq!(p.delay_before(1), Duration::ZERO);
    /// assert_eq!(p.delay_before(2), Duration::from_secs(1));
    /// assert_eq!(p.delay_before(3), Duration::from_secs(2));
    /// assert_eq!(p.delay_before(4), Duration::from_secs(4));
    /// ```
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 2).min(31);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, the classifier says stop, or the attempt
    /// budget is spent. `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut, C>(&self, mut op: F, classify: C) -> Result<T, RetryFailure<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> RetryDecision,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let error = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if classify(&error) == RetryDecision::Stop {
                tracing::warn!(attempt, error = %error, "retry.not_retryable");
                return Err(RetryFailure {
                    error,
                    attempts: attempt,
                });
            }
            if attempt >= max_attempts {
                tracing::warn!(attempt, max_attempts, error = %error, "retry.exhausted");
                return Err(RetryFailure {
                    error,
                    attempts: attempt,
                });
            }

            attempt += 1;
            let delay = self.delay_before(attempt);
            tracing::warn!(
                next_attempt = attempt,
                max_attempts,
                backoff_ms = delay.as_millis() as u64,
                error = %error,
                "retry.backing_off"
            );
            sleep(delay).await;
        }
    }
}
