//! Per-provider retry policy.
//!
//! Rate limits back off exponentially with jitter so concurrent walks do not
//! retry in lockstep; transient failures back off linearly.

use std::time::Duration;

use rand::Rng;

use crate::errors::RetryClass;

/// Default retries after a 429 before moving to the next provider.
pub const DEFAULT_RATE_LIMIT_RETRIES: u32 = 3;

/// Default retries after a transient failure before moving on.
pub const DEFAULT_TRANSIENT_RETRIES: u32 = 2;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub rate_limit_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Jitter as a percentage of the capped delay, applied in both directions.
    pub jitter_percent: u64,
    pub transient_retries: u32,
    pub linear_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_retries: DEFAULT_RATE_LIMIT_RETRIES,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            jitter_percent: 20,
            transient_retries: DEFAULT_TRANSIENT_RETRIES,
            linear_step: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// No retries and no waiting. Useful in tests.
    pub fn immediate() -> Self {
        Self {
            rate_limit_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter_percent: 0,
            transient_retries: 0,
            linear_step: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based) for an error of `class`.
    ///
    /// Returns `None` once the class's retry budget is spent, or for classes
    /// that are never retried on the same provider.
    pub fn delay_for(&self, class: RetryClass, attempt: u32) -> Option<Duration> {
        match class {
            RetryClass::ExponentialBackoff if attempt < self.rate_limit_retries => {
                Some(self.exponential(attempt))
            }
            RetryClass::LinearBackoff if attempt < self.transient_retries => {
                Some(self.linear_step * (attempt + 1))
            }
            _ => None,
        }
    }

    /// `base * 2^attempt`, capped at `max_delay`, with +/- jitter.
    pub fn exponential(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let capped = base
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.max_delay.as_millis() as u64);

        let jitter_range = (capped * self.jitter_percent) / 100;
        if jitter_range == 0 {
            return Duration::from_millis(capped);
        }
        let jitter: i64 =
            rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
        Duration::from_millis((capped as i64 + jitter).max(0) as u64)
    }
}
