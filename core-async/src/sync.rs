//! Channels shared by the bridge crates.
//!
//! Native builds use Tokio's unbounded mpsc channel. WASM builds fall back to
//! `futures::channel::mpsc`, which is single-threaded but covers the
//! unbounded sender/receiver pair the native inbox relies on.

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::sync::mpsc;

#[cfg(target_arch = "wasm32")]
pub use futures::channel::mpsc;
