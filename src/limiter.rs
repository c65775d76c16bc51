//! Outbound call spacing

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Minimum gap between the starts of consecutive model calls
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Enforces a minimum interval between outbound model calls
///
/// A single shared cursor records when the previous call was granted.
/// Callers queue on the internal mutex, so grants are FIFO by arrival
/// order. The orchestrator issues calls one at a time, so there is never
/// more than one waiter in practice.
///
/// Constructed explicitly and owned by the orchestrator; timing tests run
/// it under tokio's paused clock.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Suspend until the minimum interval since the previous grant has
    /// elapsed, then record this grant's start time
    ///
    /// Never blocks a thread; the wait is bounded by `min_interval`.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                trace!(wait_ms = (ready_at - now).as_millis() as u64, "rate limit wait");
                sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MIN_REQUEST_INTERVAL)
    }
}
