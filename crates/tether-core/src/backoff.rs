//! Exponential backoff between reconnect attempts.

use std::time::Duration;

/// Stateless backoff policy.
///
/// The wait for attempt `n` (zero-based) is `min * factor^n`, clamped to
/// `max`. With jitter enabled the result is drawn uniformly from
/// `[min, clamped)`, so it still never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Wait before the first retry.
    pub min: Duration,
    /// Upper bound for any wait.
    pub max: Duration,
    /// Growth factor per attempt. Values below 1.0 are treated as 1.0.
    pub factor: f64,
    /// Randomize each wait below its exponential value.
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(100),
            max: Duration::from_secs(5 * 60),
            factor: 2.0,
            jitter: true,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy without jitter.
    pub fn new(min: Duration, max: Duration, factor: f64) -> Self {
        Self {
            min,
            max,
            factor,
            jitter: false,
        }
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns the wait before retrying after `attempt` failures (zero-based).
    pub fn next(&self, attempt: u32) -> Duration {
        let min = self.min.as_secs_f64();
        let max = self.max.as_secs_f64().max(min);
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);

        let mut wait = min * self.factor.max(1.0).powi(exponent);
        if !wait.is_finite() || wait > max {
            wait = max;
        }
        if self.jitter && wait > min {
            wait = fastrand::f64() * (wait - min) + min;
        }

        Duration::from_secs_f64(wait.min(max))
    }
}

/// Attempt counter paired with a [`BackoffPolicy`].
///
/// Owned and mutated only by the orchestrator between attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    /// Creates a counter positioned at the first attempt.
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Returns the wait for the current attempt and advances the counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.policy.next(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Number of waits handed out since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns to the initial attempt.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// The underlying policy.
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(5), 2.0)
    }

    #[test]
    fn test_exponential_sequence() {
        let policy = policy();
        let waits: Vec<_> = (0..4).map(|n| policy.next(n)).collect();
        assert_eq!(
            waits,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn test_clamped_at_max() {
        let policy = policy();
        assert_eq!(policy.next(6), Duration::from_secs(5));
        assert_eq!(policy.next(60), Duration::from_secs(5));
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_non_decreasing_without_jitter() {
        let policy = policy();
        let mut previous = Duration::ZERO;
        for attempt in 0..200 {
            let wait = policy.next(attempt);
            assert!(wait >= previous);
            assert!(wait <= policy.max);
            previous = wait;
        }
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = policy().with_jitter(true);
        for attempt in 0..32 {
            let wait = policy.next(attempt);
            assert!(wait >= policy.min, "attempt {attempt}: {wait:?}");
            assert!(wait <= policy.max, "attempt {attempt}: {wait:?}");
        }
        assert_eq!(policy.next(0), policy.min);
    }

    #[test]
    fn test_factor_below_one_is_flat() {
        let policy = BackoffPolicy::new(Duration::from_millis(50), Duration::from_secs(1), 0.5);
        assert_eq!(policy.next(0), Duration::from_millis(50));
        assert_eq!(policy.next(10), Duration::from_millis(50));
    }

    #[test]
    fn test_counter_and_reset() {
        let mut backoff = Backoff::new(policy());
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.attempt(), 2);

        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
