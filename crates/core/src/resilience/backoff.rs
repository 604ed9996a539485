//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::PacingConfig;

/// Largest exponent applied; keeps the multiplier from overflowing.
const MAX_EXPONENT: u32 = 16;

/// Backoff delay for the given zero-based retry attempt.
///
/// Returns `2^attempt * base * U(0.5, 1.5)`. The ±50% jitter keeps retries
/// from many concurrent jobs from landing on the upstream at the same instant.
pub fn jittered_backoff(attempt: u32, base: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.5..1.5);
    exponential(attempt, base).mul_f64(factor)
}

fn exponential(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(1u32 << attempt.min(MAX_EXPONENT))
}

/// Retry bounds and delay shape for one class of outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Jittered backoff when true, plain doubling when false.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Policy for fetches against the rate-limited scraping target.
    pub fn scraping() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            jitter: true,
        }
    }

    /// Policy for trusted auxiliary lookups: three attempts, fixed doubling.
    pub fn external() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            jitter: false,
        }
    }

    /// Scraping policy with bounds taken from configuration.
    pub fn from_pacing(pacing: &PacingConfig) -> Self {
        Self {
            max_attempts: pacing.max_retries,
            base_delay: Duration::from_millis(pacing.retry_base_delay_ms),
            jitter: true,
        }
    }

    /// Delay to sleep before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.jitter {
            jittered_backoff(attempt, self.base_delay)
        } else {
            exponential(attempt, self.base_delay)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::scraping()
    }
}
