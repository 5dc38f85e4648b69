//! Retry delays between fetch attempts

use ::backoff::backoff::Backoff;
use ::backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

/// Exponential retry delays: `base`, `2·base`, `4·base`, ... capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBackoff {
    base: Duration,
    max: Duration,
}

impl RetryBackoff {
    pub const fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Starts a fresh delay sequence for one URL
    ///
    /// Delays are deterministic (no jitter) and the sequence never ends on
    /// its own; the attempt bound lives in `RetryPolicy`.
    pub fn schedule(&self) -> RetrySchedule {
        let inner = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.base)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(self.max)
            .with_max_elapsed_time(None)
            .build();
        RetrySchedule {
            inner,
            max: self.max,
        }
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Delay sequence for the retries of a single URL
pub struct RetrySchedule {
    inner: ExponentialBackoff,
    max: Duration,
}

impl RetrySchedule {
    /// Delay to wait before the next attempt
    pub fn next_delay(&mut self) -> Duration {
        self.inner.next_backoff().unwrap_or(self.max).min(self.max)
    }
}
