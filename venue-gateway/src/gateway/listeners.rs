//! Failure listener registry.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::broadcast;
use venue_common::{FailureEvent, FailureKind};

/// Callback invoked with the failure kind and a human-readable message.
pub type FailureCallback = dyn Fn(FailureKind, &str) + Send + Sync;

type ListenerList = Vec<(u64, Arc<FailureCallback>)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: ListenerList,
}

/// Registered failure callbacks plus a broadcast channel of the same events.
pub struct FailureListeners {
    registry: Arc<Mutex<Registry>>,
    events: broadcast::Sender<FailureEvent>,
}

impl FailureListeners {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            events,
        }
    }

    fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
        registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a callback. Dropping the returned handle does not unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(FailureKind, &str) + Send + Sync + 'static,
    {
        let mut registry = Self::lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(callback)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Receive every future failure as a `FailureEvent`.
    pub fn events(&self) -> broadcast::Receiver<FailureEvent> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        Self::lock(&self.registry).listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener registered at the time of the call.
    ///
    /// The registry lock is released before callbacks run, so a callback may
    /// subscribe or unsubscribe. A panicking callback is logged and skipped.
    pub fn notify(&self, kind: FailureKind, message: &str) {
        let snapshot: Vec<Arc<FailureCallback>> = Self::lock(&self.registry)
            .listeners
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(kind, message))).is_err() {
                tracing::error!("Failure listener panicked while handling {} event", kind);
            }
        }

        // No receivers is fine.
        let _ = self.events.send(FailureEvent::new(kind, message));
    }
}

impl Default for FailureListeners {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `FailureListeners::subscribe`.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove this exact callback. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            FailureListeners::lock(&registry)
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
