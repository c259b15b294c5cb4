//! Timer abstractions.
//!
//! - Native: re-exports `tokio::time`, so paused-clock tests (`start_paused`)
//!   drive every poll loop deterministically.
//! - `timeout` bounds a wait that has no attempt count of its own.
//! - WASM: `sleep` is backed by the browser's `setTimeout` through
//!   `gloo-timers`; each tick is a scheduled callback, never a busy wait.

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::time::{sleep, timeout, Instant};

pub use std::time::Duration;

#[cfg(target_arch = "wasm32")]
/// Suspends the current task for `duration` using `setTimeout`.
pub async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await
}

#[cfg(target_arch = "wasm32")]
/// Requires `future` to complete before `duration` has elapsed.
pub async fn timeout<F>(duration: Duration, future: F) -> Result<F::Output, TimeoutError>
where
    F: std::future::Future,
{
    let sleep_fut = sleep(duration);

    futures::pin_mut!(future);
    futures::pin_mut!(sleep_fut);

    match futures::future::select(future, sleep_fut).await {
        futures::future::Either::Left((output, _)) => Ok(output),
        futures::future::Either::Right(_) => Err(TimeoutError),
    }
}

#[cfg(target_arch = "wasm32")]
/// Error returned when a timeout expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutError;

#[cfg(target_arch = "wasm32")]
impl std::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation timed out")
    }
}

#[cfg(target_arch = "wasm32")]
impl std::error::Error for TimeoutError {}

/// Converts a millisecond count from host configuration into a `Duration`.
pub const fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
