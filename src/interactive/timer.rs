//! Single resettable countdown.
//!
//! Each arm bumps a generation counter. The expiry callback receives the generation it
//! was armed with and must `claim` it before acting, so a countdown that was reset or
//! cancelled after its sleep already finished still does nothing.

use std::future::Future;
use std::time::Duration;
use tokio::task::AbortHandle;

/// A countdown that fires at most once per arm.
#[derive(Debug, Default)]
pub struct LifetimeTimer {
    generation: u64,
    handle: Option<AbortHandle>,
}

impl LifetimeTimer {
    /// Creates a disarmed timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any pending countdown and starts a new one.
    ///
    /// `on_expiry` runs on a spawned task after `duration`, receiving the generation
    /// this arm was assigned.
    pub fn arm<F, Fut>(&mut self, duration: Duration, on_expiry: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        // Created here so the deadline counts from the arm, not from the first poll.
        // Far-future deadlines are clamped instead of overflowing.
        let sleep = tokio::time::sleep(duration);
        let task = tokio::spawn(async move {
            sleep.await;
            on_expiry(generation).await;
        });
        self.handle = Some(task.abort_handle());
        generation
    }

    /// Cancels the pending countdown, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Called from the expiry callback. Returns `true` (and disarms without aborting
    /// the running task) only if `generation` is still the current arm.
    pub fn claim(&mut self, generation: u64) -> bool {
        if self.handle.is_some() && self.generation == generation {
            self.handle = None;
            true
        } else {
            false
        }
    }

    /// Whether a countdown is pending.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for LifetimeTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
