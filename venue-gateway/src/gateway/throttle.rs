//! Minimum-gap gate for outbound call starts.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces out the starts of outbound calls by at least `min_gap`.
///
/// Each caller reserves the next free start slot under a short lock and then
/// sleeps until that slot outside the lock, so concurrent callers queue behind each
/// other's reservations. Completion is not serialized.
#[derive(Debug)]
pub struct Throttle {
    min_gap: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_start: Mutex::new(None),
        }
    }

    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }

    /// Wait for this caller's start slot and return it.
    pub async fn acquire(&self) -> Instant {
        let slot = self.reserve().await;
        if slot > Instant::now() {
            tracing::debug!(
                "Throttling outbound call for {}ms",
                slot.saturating_duration_since(Instant::now()).as_millis()
            );
            sleep_until(slot).await;
        }
        slot
    }

    async fn reserve(&self) -> Instant {
        let mut last_start = self.last_start.lock().await;
        let now = Instant::now();
        let slot = match *last_start {
            Some(previous) => (previous + self.min_gap).max(now),
            None => now,
        };
        *last_start = Some(slot);
        slot
    }
}
