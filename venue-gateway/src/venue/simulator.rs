//! Random occupancy drift for demos.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::RwLock;

use super::{CountUpdate, VenueState};

/// Periodically nudges a random section's occupancy.
pub struct CrowdSimulator {
    venue: Arc<RwLock<VenueState>>,
    interval: Duration,
}

impl CrowdSimulator {
    /// Smallest and largest fluctuation applied per tick.
    pub const FLUCTUATION: std::ops::RangeInclusive<i64> = -3..=8;
    /// Flow rate assigned to the touched section, people per minute.
    pub const FLOW_RATE: std::ops::RangeInclusive<u32> = 5..=29;

    pub fn new(venue: Arc<RwLock<VenueState>>, interval: Duration) -> Self {
        Self { venue, interval }
    }

    /// Run forever, one step per interval.
    pub async fn run(self) {
        let mut rng = StdRng::from_entropy();
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let mut venue = self.venue.write().await;
            if let Some(update) = Self::step(&mut venue, &mut rng) {
                tracing::debug!(
                    "Simulated drift in {}: {} -> {}",
                    update.section_id,
                    update.previous,
                    update.current
                );
            }
        }
    }

    /// Apply one random fluctuation. Returns `None` for an empty venue.
    pub fn step<R: Rng>(venue: &mut VenueState, rng: &mut R) -> Option<CountUpdate> {
        if venue.sections().is_empty() {
            return None;
        }
        let index = rng.gen_range(0..venue.sections().len());
        let section = &venue.sections()[index];
        let id = section.id.clone();
        let fluctuation = rng.gen_range(Self::FLUCTUATION);
        let next = (i64::from(section.occupancy) + fluctuation).clamp(0, i64::from(u32::MAX)) as u32;

        let update = venue.apply_count(&id, next).ok()?;
        venue.set_flow_rate(&id, rng.gen_range(Self::FLOW_RATE)).ok()?;
        Some(update)
    }
}
