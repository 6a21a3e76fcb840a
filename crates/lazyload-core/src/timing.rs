//! Time helpers for load callbacks
//!
//! The engine exposes `min_animation_duration_ms` but leaves enforcing it to
//! the callback. These helpers let a callback keep its transition on screen
//! for at least that long.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Time still to wait so that `min` has elapsed since `start`
#[inline]
pub fn remaining(start: Instant, min: Duration) -> Duration {
    min.saturating_sub(start.elapsed())
}

/// Await `fut`, then pad the total time up to `min`
pub async fn hold_at_least<F: Future>(min: Duration, fut: F) -> F::Output {
    let start = Instant::now();
    let output = fut.await;
    let rest = remaining(start, min);
    if !rest.is_zero() {
        tokio::time::sleep(rest).await;
    }
    output
}
