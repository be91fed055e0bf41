//! Retry policy for remote validation calls.

use std::time::Duration;

/// Bounded retry with linear backoff.
///
/// Only transport-level failures (timeout, connect error) and 5xx
/// responses are retried; a definitive rejection is never retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Added to the delay on each subsequent retry.
    pub step: Duration,
}

impl RetryPolicy {
    /// Creates a policy with an explicit retry budget.
    pub fn new(max_retries: u32, base_delay: Duration, step: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            step,
        }
    }

    /// Total attempts including the initial one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Backoff before retry number `retry` (zero-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.base_delay + self.step * retry
    }
}

impl Default for RetryPolicy {
    /// 3 retries, backing off 1s, 1.5s, 2s.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            step: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_backoff_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(1500));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
    }

    #[test]
    fn test_custom_policy() {
        let policy = RetryPolicy::new(1, Duration::from_millis(10), Duration::ZERO);
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.backoff_for(5), Duration::from_millis(10));
    }
}
