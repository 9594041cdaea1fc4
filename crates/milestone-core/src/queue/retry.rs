//! Retry policy: decides backoff delays.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for failed mail deliveries.
///
/// delay = min(base_delay * multiplier^(attempts - 1), max_delay)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Base delay for the first retry.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for a single backoff.
    pub max_delay: Duration,

    /// Transport calls allowed per mail before it is marked dead.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// 1 時間
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60 * 60);

    pub fn new(base_delay: Duration, multiplier: f64, max_attempts: u32) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay: Self::DEFAULT_MAX_DELAY.max(base_delay),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Calculate delay for the next retry based on attempt number.
    ///
    /// Example with base_delay=2s, multiplier=2.0:
    /// - attempt 1 (first failure): 2s
    /// - attempt 2: 4s
    /// - attempt 3: 8s
    ///
    /// `Duration` に収まらない値（NaN、負、巨大）は `max_delay` になる。
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base_secs = self.base_delay.as_secs_f64();
        let exponent = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_secs = base_secs * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay_secs)
            .map(|delay| delay.min(self.max_delay))
            .unwrap_or(self.max_delay)
    }
}

impl Default for RetryPolicy {
    /// 2s base, 2.0 multiplier, 1h cap, 5 attempts.
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 2.0, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_policy_has_reasonable_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.multiplier, 2.0);
        assert_eq!(policy.max_delay, RetryPolicy::DEFAULT_MAX_DELAY);
        assert_eq!(policy.max_attempts, 5);
    }

    #[test]
    fn exponential_backoff_increases() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.next_delay(1), Duration::from_secs(2));
        assert_eq!(policy.next_delay(2), Duration::from_secs(4));
        assert_eq!(policy.next_delay(3), Duration::from_secs(8));
        // attempts=0 behaves like the first retry
        assert_eq!(policy.next_delay(0), Duration::from_secs(2));
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        let policy = RetryPolicy::new(Duration::from_millis(10), 1.0, 0);
        assert_eq!(policy.max_attempts, 1);
    }

    #[rstest]
    #[case::twentieth_attempt_x10(2_000, 10.0, 20)]
    #[case::thirtieth_attempt_x10(2_000, 10.0, 30)]
    #[case::huge_attempts(1_000, 2.0, u32::MAX)]
    #[case::float_overflow(1_000, 1e308, 5)]
    fn oversized_backoff_is_capped(
        #[case] base_ms: u64,
        #[case] multiplier: f64,
        #[case] attempts: u32,
    ) {
        let policy = RetryPolicy::new(Duration::from_millis(base_ms), multiplier, 30)
            .with_max_delay(Duration::from_secs(600));
        assert_eq!(policy.next_delay(attempts), Duration::from_secs(600));
    }

    #[test]
    fn delay_below_cap_is_untouched() {
        let policy = RetryPolicy::new(Duration::from_secs(2), 10.0, 30)
            .with_max_delay(Duration::from_secs(600));
        assert_eq!(policy.next_delay(3), Duration::from_secs(200));
        assert_eq!(policy.next_delay(4), Duration::from_secs(600));
    }
}
