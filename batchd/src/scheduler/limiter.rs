//! Minimum-spacing rate limiter
//!
//! One global limiter for the whole scheduler: every batch, whatever its
//! priority or ingestion, shares the same throughput ceiling.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_spacing: Duration,
    last_finish: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_finish: None,
        }
    }

    /// How long to pause before the next execution may start.
    ///
    /// `max(0, min_spacing - (now - last_finish))`, zero before any batch has
    /// finished.
    pub fn wait_interval(&self, now: Instant) -> Duration {
        match self.last_finish {
            None => Duration::ZERO,
            Some(finished) => self.min_spacing.saturating_sub(now.saturating_duration_since(finished)),
        }
    }

    /// Record that a batch finished executing, successfully or not
    pub fn mark_finished(&mut self, now: Instant) {
        self.last_finish = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACING: Duration = Duration::from_secs(5);

    #[test]
    fn test_unset_means_no_wait() {
        let limiter = RateLimiter::new(SPACING);
        assert_eq!(limiter.wait_interval(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_pads_up_to_spacing() {
        let mut limiter = RateLimiter::new(SPACING);
        let finished = Instant::now();
        limiter.mark_finished(finished);

        assert_eq!(limiter.wait_interval(finished), SPACING);
        assert_eq!(
            limiter.wait_interval(finished + Duration::from_secs(2)),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_elapsed_spacing_means_no_wait() {
        let mut limiter = RateLimiter::new(SPACING);
        let finished = Instant::now();
        limiter.mark_finished(finished);

        assert_eq!(limiter.wait_interval(finished + SPACING), Duration::ZERO);
        assert_eq!(limiter.wait_interval(finished + Duration::from_secs(60)), Duration::ZERO);
    }

    #[test]
    fn test_clock_before_finish_saturates() {
        let mut limiter = RateLimiter::new(SPACING);
        let now = Instant::now();
        limiter.mark_finished(now + Duration::from_secs(1));
        assert_eq!(limiter.wait_interval(now), SPACING);
    }
}
