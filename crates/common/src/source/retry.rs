//! Bounded retry with exponential backoff
//!
//! An explicit policy object driving the retry loops in source adapters,
//! testable without any network dependency.

use std::time::Duration;

/// Retry policy: maximum attempts and an exponential delay schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each subsequent one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit bounds.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait before retry number `retry` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry)
    }

    /// Whether another attempt is allowed after `attempts` tries so far.
    pub fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
    }

    #[test]
    fn test_attempt_bound() {
        let policy = RetryPolicy::default();
        assert!(policy.allows(0));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }

    #[test]
    fn test_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        assert!(policy.allows(0));
        assert!(!policy.allows(1));
    }
}
