//! Threading bounds that follow the target.
//!
//! Native adapters are shared across Tokio tasks and must be `Send + Sync`.
//! The page context compiles to `wasm32`, where browser handles (`JsValue`,
//! `web_sys` objects) are neither, and everything runs on one thread anyway.

/// `Send + Sync` on native targets, no bound on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}
