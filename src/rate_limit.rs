//! Minimum-spacing throttle for outbound API requests.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Default spacing between two API requests.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Spaces consecutive requests at least `min_interval` apart.
///
/// Each caller reserves the next free slot under the lock and then sleeps
/// until it, so two overlapping calls are spaced as well. Nothing is queued
/// or cancelled beyond that: every caller eventually proceeds.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_issued: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_issued: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be issued and return the slot it was given.
    pub async fn acquire(&self) -> Instant {
        let slot = {
            let mut last = self.last_issued.lock().await;
            let now = Instant::now();
            let slot = match *last {
                Some(prev) => std::cmp::max(now, prev + self.min_interval),
                None => now,
            };
            *last = Some(slot);
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            log::debug!("rate limiter: delaying request by {}ms", wait.as_millis());
        }
        sleep_until(slot).await;
        slot
    }

    /// Time of the most recently reserved slot, if any.
    pub async fn last_issued(&self) -> Option<Instant> {
        *self.last_issued.lock().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
