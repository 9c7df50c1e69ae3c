//! Retry policy for item attempts.

use std::time::Duration;

/// Fixed-budget, constant-delay retry policy.
///
/// The budget is configured per run, not per item. The delay is constant
/// rather than exponential: the bottleneck is a rate-limited remote call,
/// not overload, so spreading attempts further apart buys nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    max_retries: u32,
    /// Fixed delay between attempts.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, delay: Duration::from_secs(2) }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Whether a failed attempt (0-based) leaves budget for another try.
    #[must_use]
    pub fn should_retry(&self, failed_attempt: u32) -> bool {
        failed_attempt < self.max_retries
    }

    /// Total attempts an item may consume: the first try plus the retries.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// The configured retry budget.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the next attempt.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
