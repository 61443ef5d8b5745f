//! Time-boxed degraded mode entered after a quota error.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Default)]
struct DegradedState {
    /// End of the current degraded window.
    until: Option<Instant>,
    /// Scheduled reset for the current window.
    reset_task: Option<JoinHandle<()>>,
}

impl DegradedState {
    fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    fn cancel_reset(&mut self) {
        if let Some(task) = self.reset_task.take() {
            task.abort();
        }
    }
}

/// Degraded-mode flag with a cancellable scheduled reset.
///
/// The window deadline is stored alongside the flag, so the flag reads as
/// cleared once the deadline passes even before the reset task has run, and a
/// stale reset task can never clear a newer window.
#[derive(Debug)]
pub struct DegradedMode {
    cooldown: Duration,
    state: Arc<Mutex<DegradedState>>,
}

impl DegradedMode {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: Arc::new(Mutex::new(DegradedState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DegradedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_active(Instant::now())
    }

    /// Time left in the current window, if degraded.
    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        let state = self.lock();
        state
            .until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// Enter (or re-arm) degraded mode for one cooldown window.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enter(&self) {
        let until = Instant::now() + self.cooldown;
        let mut state = self.lock();
        state.cancel_reset();
        state.until = Some(until);

        let weak: Weak<Mutex<DegradedState>> = Arc::downgrade(&self.state);
        state.reset_task = Some(tokio::spawn(async move {
            sleep_until(until).await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut state = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if state.until == Some(until) {
                state.until = None;
                state.reset_task = None;
                tracing::info!("Quota cooldown elapsed, leaving degraded mode");
            }
        }));

        tracing::warn!(
            "Entering degraded mode for {}s after quota exhaustion",
            self.cooldown.as_secs()
        );
    }

    /// Leave degraded mode now and cancel the pending reset.
    ///
    /// Returns whether degraded mode was active. Idempotent.
    pub fn reset(&self) -> bool {
        let mut state = self.lock();
        let was_active = state.is_active(Instant::now());
        state.cancel_reset();
        state.until = None;
        if was_active {
            tracing::info!("Degraded mode cleared manually");
        }
        was_active
    }

    #[cfg(test)]
    fn has_pending_reset(&self) -> bool {
        self.lock().reset_task.is_some()
    }
}

impl Drop for DegradedMode {
    fn drop(&mut self) {
        self.lock().cancel_reset();
    }
}
