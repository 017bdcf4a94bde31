//! Minimum-interval rate limiting for checkers that call external services.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces successive calls at least `min_interval` apart.
///
/// The limiter is shared by every worker using the same checker instance.
/// The last-call timestamp is held locked across the wait, so concurrent
/// callers queue up and each one is released a full interval after the
/// previous one.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Allow at most `max_calls` calls per second. Zero is treated as one.
    pub fn per_second(max_calls: u32) -> Self {
        Self::with_interval(Duration::from_secs(1) / max_calls.max(1))
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next call is permitted, then record it.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(prev) = *last_call {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
