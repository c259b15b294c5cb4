//! Task spawning.
//!
//! Native targets hand futures to Tokio and get a `JoinHandle` back. In the
//! browser there is a single thread, so futures are queued on the page's
//! microtask loop with `spawn_local` and do not need to be `Send`.

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::task::JoinHandle;

#[cfg(not(target_arch = "wasm32"))]
/// Spawns `future` on the current Tokio runtime.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

#[cfg(target_arch = "wasm32")]
/// Queues `future` on the browser event loop. The result is discarded.
pub fn spawn<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future)
}
