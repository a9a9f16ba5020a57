/// Bounded exponential backoff for idempotent read requests. Mutations
/// (upload, analyze) never retry; they fail fast and surface the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt after `failures` attempts have failed,
    /// or `None` when the budget is spent. The first retry waits
    /// `base_delay_ms`, each further retry doubles it up to `max_delay_ms`.
    pub fn delay_after(&self, failures: u32) -> Option<u64> {
        if failures == 0 || failures >= self.max_attempts {
            return None;
        }
        let factor = 1_u64.checked_shl(failures - 1).unwrap_or(u64::MAX);
        Some(
            self.base_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_budget_spent() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Some(250));
        assert_eq!(policy.delay_after(2), Some(500));
        assert_eq!(policy.delay_after(3), None);
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 500,
            max_delay_ms: 2_000,
        };
        assert_eq!(policy.delay_after(1), Some(500));
        assert_eq!(policy.delay_after(2), Some(1_000));
        assert_eq!(policy.delay_after(3), Some(2_000));
        assert_eq!(policy.delay_after(4), Some(2_000));
    }

    #[test]
    fn zero_failures_never_waits() {
        assert_eq!(RetryPolicy::default().delay_after(0), None);
    }

    #[test]
    fn large_failure_counts_do_not_overflow() {
        let policy = RetryPolicy {
            max_attempts: u32::MAX,
            base_delay_ms: 250,
            max_delay_ms: 4_000,
        };
        assert_eq!(policy.delay_after(200), Some(4_000));
    }
}
