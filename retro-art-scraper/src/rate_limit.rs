//! Process-wide spacing of outbound API calls.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Minimum spacing between two API requests, across all workers.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1200);

/// Serialises API calls so that consecutive grants are at least
/// [`MIN_REQUEST_INTERVAL`] apart, no matter how many workers share it.
///
/// One instance is created per run and handed to every caller behind an
/// `Arc`. The lock is held only while deciding and sleeping out the wait,
/// never across the request that follows.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_interval(MIN_REQUEST_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Wait until the interval since the previous grant has elapsed, then
    /// record this grant.
    pub async fn acquire(&self) {
        let mut last = self.last_grant.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                log::debug!("Rate limit: waiting {}ms", wait.as_millis());
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}
