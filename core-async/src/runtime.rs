//! Executor handles for native hosts.
//!
//! The logging layer needs to know whether it is already running inside a
//! Tokio runtime before forwarding events to an async host sink.

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs `future` to completion on a throwaway current-thread runtime.
///
/// Returns an error instead of panicking when the runtime cannot be built.
#[cfg(not(target_arch = "wasm32"))]
pub fn block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}
