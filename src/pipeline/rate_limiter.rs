//! Global request pacing
//!
//! Every outbound request, retries included, takes one slot from a single
//! [`RateLimiter`] shared by all workers. Slots are granted no sooner than
//! `interval` after the previous grant.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Global rate limiter shared across fetch tasks
///
/// The last grant instant sits behind a `tokio::sync::Mutex`, which queues
/// waiters in FIFO order. The lock is held while sleeping, so grants are
/// issued one at a time and in request order.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between two grants
    interval: Duration,

    /// Time of the previous grant, `None` before the first one
    last_grant: Mutex<Option<Instant>>,

    /// Total number of grants issued
    grants: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum spacing
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_grant: Mutex::new(None),
            grants: AtomicU64::new(0),
        }
    }

    /// Waits for the next request slot
    ///
    /// The first call returns immediately. Each later call returns at least
    /// `interval` after the previous call returned.
    pub async fn acquire(&self) {
        let mut last = self.last_grant.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                tracing::trace!(
                    "Rate limit: waiting {:?} for next slot",
                    ready_at - Instant::now()
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
        self.grants.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the configured spacing
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the number of slots granted so far
    pub fn grants(&self) -> u64 {
        self.grants.load(Ordering::Relaxed)
    }
}
