//! Token-bucket rate gate shared by every fetch attempt
//!
//! The gate is built once at startup. Its only reconfiguration (applying the
//! robots.txt crawl delay) takes `&mut self`, so it necessarily happens
//! before the gate is wrapped in an `Arc` and handed to fetch workers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Longest single sleep before the bucket is checked again
const MAX_WAIT: Duration = Duration::from_secs(60);

/// Longest honored robots.txt crawl delay
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(3600);

/// Errors from waiting on the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("rate limiter wait cancelled")]
    Cancelled,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
struct TokenBucket {
    /// Tokens added per second
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    fn new(rate: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Takes a token if one is available, otherwise reports how long to wait
    async fn try_take(&self) -> Option<Duration> {
        let mut state = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return None;
        }

        let seconds_to_wait = (1.0 - state.tokens) / self.rate;
        let wait = Duration::try_from_secs_f64(seconds_to_wait).unwrap_or(MAX_WAIT);
        Some(wait.clamp(Duration::from_millis(1), MAX_WAIT))
    }
}

/// Shared request limiter
///
/// A rate of zero means unbounded: acquisitions succeed immediately.
#[derive(Debug)]
pub struct RateGate {
    bucket: Option<TokenBucket>,
    granted: AtomicU64,
}

impl RateGate {
    /// Creates a gate allowing `rate` requests per second with the given burst
    ///
    /// # Arguments
    ///
    /// * `rate` - Sustained requests per second (0 = unbounded)
    /// * `burst` - Bucket capacity; the bucket starts full
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            bucket: Self::bucket_for(rate, burst),
            granted: AtomicU64::new(0),
        }
    }

    /// Creates a gate that never waits
    pub fn unbounded() -> Self {
        Self::new(0.0, 0)
    }

    /// Builds the gate for a run from the configured rate and the policy delay
    ///
    /// An explicit `rate_limit` always wins and the crawl delay is ignored.
    /// Without one, a nonzero crawl delay `d` becomes a rate of `1/d` with a
    /// burst of one. Otherwise the gate is unbounded.
    ///
    /// # Arguments
    ///
    /// * `rate_limit` - Requests per second from configuration (0 = not set)
    /// * `burst` - Configured burst; defaults to `floor(rate_limit) + 1`
    /// * `crawl_delay` - Delay from robots.txt for our agent
    pub fn for_run(rate_limit: f64, burst: Option<u32>, crawl_delay: Duration) -> Self {
        let mut gate = Self::new(rate_limit, burst.unwrap_or_else(|| default_burst(rate_limit)));

        if rate_limit > 0.0 {
            tracing::info!("Using configured rate limit: {:.1} req/sec", rate_limit);
        } else if !crawl_delay.is_zero() {
            gate.apply_crawl_delay(crawl_delay);
        } else {
            tracing::info!("No Crawl-Delay in robots.txt - using unlimited rate");
        }

        gate
    }

    /// Replaces the bucket with one derived from a crawl delay
    ///
    /// Delays above [`MAX_CRAWL_DELAY`] are clamped to it.
    pub fn apply_crawl_delay(&mut self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        if delay > MAX_CRAWL_DELAY {
            tracing::warn!(
                "Crawl-Delay of {}s is excessive, clamping to {}s",
                delay.as_secs(),
                MAX_CRAWL_DELAY.as_secs()
            );
        }
        let delay = delay.min(MAX_CRAWL_DELAY);
        let rate = 1.0 / delay.as_secs_f64();
        tracing::info!(
            "Applying robots.txt Crawl-Delay: {:?} ({:.2} req/sec)",
            delay,
            rate
        );
        self.reconfigure(rate, 1);
    }

    /// Replaces the limiter configuration
    ///
    /// Requires exclusive access, so it cannot race with acquisitions.
    pub fn reconfigure(&mut self, rate: f64, burst: u32) {
        self.bucket = Self::bucket_for(rate, burst);
    }

    fn bucket_for(rate: f64, burst: u32) -> Option<TokenBucket> {
        (rate > 0.0 && rate.is_finite()).then(|| TokenBucket::new(rate, burst))
    }

    /// Sustained rate in requests per second (0 when unbounded)
    pub fn rate(&self) -> f64 {
        self.bucket.as_ref().map(|b| b.rate).unwrap_or(0.0)
    }

    /// Bucket capacity (0 when unbounded)
    pub fn burst(&self) -> u32 {
        self.bucket.as_ref().map(|b| b.capacity as u32).unwrap_or(0)
    }

    /// Returns true if the gate never waits
    pub fn is_unbounded(&self) -> bool {
        self.bucket.is_none()
    }

    /// Number of tokens handed out so far
    pub fn granted(&self) -> u64 {
        self.granted.load(Ordering::Relaxed)
    }

    /// Waits for a token
    ///
    /// # Returns
    ///
    /// * `Ok(())` - A token was consumed
    /// * `Err(GateError::Cancelled)` - The cancellation token fired first
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), GateError> {
        if cancel.is_cancelled() {
            return Err(GateError::Cancelled);
        }

        if let Some(bucket) = &self.bucket {
            while let Some(wait) = bucket.try_take().await {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(GateError::Cancelled),
                    _ = sleep(wait) => {}
                }
            }
        }

        self.granted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Default burst for an explicit rate: one more than its whole part
fn default_burst(rate: f64) -> u32 {
    if rate > 0.0 {
        (rate.floor() as u32).saturating_add(1)
    } else {
        0
    }
}
