// Retry policy for SolaX fetches.
//
// Only timeouts are retried. The delay before attempt N follows
// `d(1) = 0, d(n+1) = 2*d(n) + 5` in units of `backoff_unit`.

use std::time::Duration;

/// Default number of attempts per fetch (first try included).
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How many attempts to make, how long each may take, and how long to wait
/// between timed-out attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `0` is treated as `1`.
    pub attempts: u32,
    /// Upper bound on a single attempt (connect + headers + body).
    pub timeout: Duration,
    /// Length of one backoff step. The sequence is `0, 5, 15, 35, …` steps.
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Fresh backoff sequence for one fetch.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            unit: self.backoff_unit,
            next_steps: 0,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

/// Infinite iterator of pre-attempt delays: `0, 5u, 15u, 35u, …`.
#[derive(Debug, Clone)]
pub struct Backoff {
    unit: Duration,
    next_steps: u32,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.unit.saturating_mul(self.next_steps);
        self.next_steps = self.next_steps.saturating_mul(2).saturating_add(5);
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_sequence_doubles_plus_five() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = policy.backoff().take(5).map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![0, 5, 15, 35, 75]);
    }

    #[test]
    fn backoff_scales_with_unit() {
        let policy = RetryPolicy {
            backoff_unit: Duration::from_millis(10),
            ..RetryPolicy::default()
        };
        let delays: Vec<Duration> = policy.backoff().take(3).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_millis(50),
                Duration::from_millis(150)
            ]
        );
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let mut backoff = RetryPolicy::default().backoff();
        let last = backoff.nth(64);
        assert!(last.is_some());
    }
}
