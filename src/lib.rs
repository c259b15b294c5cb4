//! Workspace facade crate.
//!
//! Re-exports the workspace crates behind feature flags so a host can depend
//! on `passkey-bridge` alone:
//!
//! - `desktop-shims` (default): protocol core plus the in-memory, keyring and
//!   channel adapters from `bridge-desktop`
//! - `wasm`: protocol core plus the browser bindings from `bridge-wasm`

#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use bridge_traits as traits;
#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_auth as auth;
#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_runtime as runtime;

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub use bridge_desktop as desktop;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use bridge_wasm as wasm;

#[cfg(any(feature = "desktop-shims", feature = "wasm"))]
pub use core_auth::{
    AuthFlowController, AuthOutcome, AuthSession, BridgeEnvelope, NativeBridge,
    NativeResultHandler, ScreenOutcome,
};
