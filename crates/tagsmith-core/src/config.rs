//! Run configuration for the batch engine.

use crate::batch::retry::RetryPolicy;
use crate::error::EngineError;
use std::time::Duration;

/// Static parameters for one batch run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of items processed concurrently (wave size).
    pub concurrency: usize,
    /// Maximum number of retries per item after the first attempt.
    pub max_retries: u32,
    /// Fixed delay between attempts for one item.
    pub retry_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { concurrency: 3, max_retries: 2, retry_delay: Duration::from_secs(2) }
    }
}

impl RunConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfig` if the concurrency limit is zero.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.concurrency == 0 {
            return Err(EngineError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The retry policy derived from this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = RunConfig { concurrency: 0, ..RunConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_carries_settings() {
        let config = RunConfig {
            max_retries: 5,
            retry_delay: Duration::from_millis(250),
            ..RunConfig::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.total_attempts(), 6);
        assert_eq!(policy.delay(), Duration::from_millis(250));
    }
}
