//! Adaptive inter-request pacing with a circuit breaker.

use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PacingConfig;
use crate::metrics;

use super::FetchMeta;

/// Recommends delays between page fetches within one bulk operation.
///
/// Tracks how many consecutive pages needed at least one retry. Clean pages
/// relax the pressure, retried pages scale the delay up, and once the
/// configured number of consecutive retried pages is reached the pacer
/// recommends a long cooldown and starts counting from zero again.
///
/// Owned by a single session; not shared across concurrent operations.
#[derive(Debug, Clone)]
pub struct AdaptivePacer {
    config: PacingConfig,
    consecutive_retry_pages: u32,
}

impl AdaptivePacer {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            consecutive_retry_pages: 0,
        }
    }

    /// Record the outcome of a page fetch and get the delay before the next one.
    pub fn report_page_result(&mut self, meta: &FetchMeta) -> Duration {
        if meta.retries_used == 0 {
            self.consecutive_retry_pages = self.consecutive_retry_pages.saturating_sub(1);
            return self.base_delay(1.0);
        }

        self.consecutive_retry_pages += 1;
        if self.consecutive_retry_pages >= self.config.cooldown_after {
            self.consecutive_retry_pages = 0;
            let cooldown = self.random_ms(self.config.cooldown_min_ms, self.config.cooldown_max_ms);
            metrics::PACER_COOLDOWNS.inc();
            warn!(
                cooldown_ms = cooldown.as_millis() as u64,
                encountered_503 = meta.encountered_503,
                "Sustained retry pressure, cooling down"
            );
            return cooldown;
        }

        let scale = 1.0 + 0.5 * self.consecutive_retry_pages as f64;
        let delay = self.base_delay(scale);
        debug!(
            consecutive = self.consecutive_retry_pages,
            delay_ms = delay.as_millis() as u64,
            "Page needed retries, slowing down"
        );
        delay
    }

    /// Clear accumulated pressure. Call between independent bulk operations.
    pub fn reset(&mut self) {
        self.consecutive_retry_pages = 0;
    }

    /// Consecutive pages that needed a retry.
    pub fn consecutive_retry_pages(&self) -> u32 {
        self.consecutive_retry_pages
    }

    fn base_delay(&self, scale: f64) -> Duration {
        self.random_ms(self.config.base_delay_min_ms, self.config.base_delay_max_ms)
            .mul_f64(scale)
    }

    fn random_ms(&self, min: u64, max: u64) -> Duration {
        if min >= max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Default for AdaptivePacer {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean() -> FetchMeta {
        FetchMeta::default()
    }

    fn retried() -> FetchMeta {
        FetchMeta {
            retries_used: 1,
            encountered_503: false,
        }
    }

    fn ms(d: Duration) -> u64 {
        d.as_millis() as u64
    }

    #[test]
    fn test_clean_page_uses_base_range() {
        let mut pacer = AdaptivePacer::default();
        for _ in 0..20 {
            let delay = ms(pacer.report_page_result(&clean()));
            assert!((2000..=4000).contains(&delay), "delay {}", delay);
        }
        assert_eq!(pacer.consecutive_retry_pages(), 0);
    }

    #[test]
    fn test_retried_page_scales_delay() {
        let mut pacer = AdaptivePacer::default();

        let first = ms(pacer.report_page_result(&retried()));
        assert!((3000..=6000).contains(&first), "delay {}", first);
        assert_eq!(pacer.consecutive_retry_pages(), 1);

        let second = ms(pacer.report_page_result(&retried()));
        assert!((4000..=8000).contains(&second), "delay {}", second);
        assert_eq!(pacer.consecutive_retry_pages(), 2);
    }

    #[test]
    fn test_third_retried_page_trips_cooldown_and_resets() {
        let mut pacer = AdaptivePacer::default();
        pacer.report_page_result(&retried());
        pacer.report_page_result(&retried());

        let cooldown = ms(pacer.report_page_result(&retried()));
        assert!((45_000..=60_000).contains(&cooldown), "cooldown {}", cooldown);
        assert_eq!(pacer.consecutive_retry_pages(), 0);

        // Pressure starts over after the cooldown
        let next = ms(pacer.report_page_result(&retried()));
        assert!(next < 45_000);
    }

    #[test]
    fn test_clean_page_relieves_pressure() {
        let mut pacer = AdaptivePacer::default();
        pacer.report_page_result(&retried());
        pacer.report_page_result(&retried());
        pacer.report_page_result(&clean());
        assert_eq!(pacer.consecutive_retry_pages(), 1);

        // Interleaved clean page keeps the breaker from tripping
        let delay = ms(pacer.report_page_result(&retried()));
        assert!(delay < 45_000);
        assert_eq!(pacer.consecutive_retry_pages(), 2);
    }

    #[test]
    fn test_counter_floors_at_zero() {
        let mut pacer = AdaptivePacer::default();
        pacer.report_page_result(&clean());
        pacer.report_page_result(&clean());
        assert_eq!(pacer.consecutive_retry_pages(), 0);
    }

    #[test]
    fn test_reset() {
        let mut pacer = AdaptivePacer::default();
        pacer.report_page_result(&retried());
        pacer.report_page_result(&retried());
        pacer.reset();
        assert_eq!(pacer.consecutive_retry_pages(), 0);
    }

    #[test]
    fn test_zero_width_ranges() {
        let mut pacer = AdaptivePacer::new(PacingConfig {
            base_delay_min_ms: 0,
            base_delay_max_ms: 0,
            cooldown_min_ms: 0,
            cooldown_max_ms: 0,
            ..Default::default()
        });
        assert_eq!(pacer.report_page_result(&retried()), Duration::ZERO);
        assert_eq!(pacer.report_page_result(&clean()), Duration::ZERO);
    }
}
