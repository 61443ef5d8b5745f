//! Operator-facing alert banner fed by gateway failures.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use venue_common::{FailureEvent, FailureKind};

use crate::gateway::{InferenceGateway, Subscription};

/// How long a non-quota alert stays visible.
pub const TRANSIENT_ALERT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Posted {
    event: FailureEvent,
    posted_at: Instant,
}

/// Latest failure, as shown in the dashboard banner.
///
/// Quota alerts persist until cleared; other alerts expire after
/// `TRANSIENT_ALERT_TTL`.
#[derive(Debug, Default)]
pub struct AlertBanner {
    current: Mutex<Option<Posted>>,
}

impl AlertBanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Posted>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribe a banner to a gateway's failures.
    pub fn attach(gateway: &InferenceGateway) -> (Arc<Self>, Subscription) {
        let banner = Arc::new(Self::new());
        let target = banner.clone();
        let subscription = gateway.subscribe_to_failures(move |kind, message| {
            target.post(kind, message);
        });
        (banner, subscription)
    }

    pub fn post(&self, kind: FailureKind, message: &str) {
        *self.lock() = Some(Posted {
            event: FailureEvent::new(kind, message),
            posted_at: Instant::now(),
        });
    }

    /// The visible alert, if any.
    pub fn current(&self) -> Option<FailureEvent> {
        let mut current = self.lock();
        let expired = current.as_ref().is_some_and(|posted| {
            !posted.event.kind.is_persistent() && posted.posted_at.elapsed() >= TRANSIENT_ALERT_TTL
        });
        if expired {
            *current = None;
        }
        current.as_ref().map(|posted| posted.event.clone())
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }
}
