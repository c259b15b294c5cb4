//! Runtime-agnostic async helpers for the passkey bridge.
//!
//! The page-side half of the bridge runs inside a browser event loop
//! (`wasm32`), while the native half and every test run on Tokio. This crate
//! hides the difference so the protocol crates never name an executor:
//!
//! - `time`: `sleep` and `Duration` (Tokio timers natively, `setTimeout` on WASM)
//! - `task`: fire-and-forget task spawning
//! - `sync`: channels used by the native inbox
//! - `retry`: the bounded "poll until ready or exhausted" primitive shared by
//!   every wait in the authentication flow
//!
//! # Examples
//!
//! ```rust
//! use core_async::retry::{poll_until, Probe, RetryPolicy};
//! use core_async::time::Duration;
//!
//! async fn wait_for_flag(flag: &std::sync::atomic::AtomicBool) -> bool {
//!     let policy = RetryPolicy::new(Duration::from_millis(200), 25);
//!     poll_until(policy, |_| async move {
//!         if flag.load(std::sync::atomic::Ordering::SeqCst) {
//!             Probe::Ready(())
//!         } else {
//!             Probe::Pending
//!         }
//!     })
//!     .await
//!     .is_ok()
//! }
//! ```

pub mod retry;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use retry::{poll_until, PollError, Probe, RetryPolicy};
pub use task::spawn;
pub use time::{sleep, Duration};
