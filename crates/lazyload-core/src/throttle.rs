//! Scroll throttling
//!
//! The first trigger arms a cooldown and schedules the task to run once the
//! delay has passed. Triggers arriving while the cooldown is armed are
//! dropped, not queued. The task reads whatever state exists when it finally
//! runs, so it observes the effect of every trigger it absorbed.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct Throttle {
    cooling: Arc<AtomicBool>,
}

/// Releases the cooldown even if the scheduled task is aborted mid-sleep
struct Cooldown(Arc<AtomicBool>);

impl Drop for Cooldown {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a scheduled run is still waiting out its delay
    pub fn is_cooling(&self) -> bool {
        self.cooling.load(Ordering::Acquire)
    }

    /// Schedule `task` after `delay` unless a run is already pending
    ///
    /// Returns the handle of the spawned run, or `None` when the trigger was
    /// absorbed. Must be called from within a tokio runtime.
    pub fn trigger<F, Fut>(&self, delay: Duration, task: F) -> Option<JoinHandle<Fut::Output>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        if self.cooling.swap(true, Ordering::AcqRel) {
            trace!("Trigger absorbed by active cooldown");
            return None;
        }

        let cooldown = Cooldown(Arc::clone(&self.cooling));
        Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            drop(cooldown);
            task().await
        }))
    }
}
