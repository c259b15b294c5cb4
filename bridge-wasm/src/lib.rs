//! WebAssembly Bridge Implementations
//!
//! Page-side implementations of the `bridge-traits` contracts, for the sign-in
//! page that runs inside the native app's webview.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It will not compile for native targets.
//!
//! # Implementations
//!
//! - [`GlobalCapabilityBinding`] / [`JsAuthCapability`]: the vendor passkey
//!   object on `window`
//! - [`WebViewMessagePort`]: `webkit.messageHandlers` or `AndroidBridge`
//! - [`DomLifecycle`]: `document.readyState` and `DOMContentLoaded`
//! - [`bindings`]: `initBridge`, `startAuthFlow` and `startSilentRefresh` for
//!   page scripts
//!
//! # Examples
//!
//! ```ignore
//! use std::sync::Arc;
//! use bridge_wasm::{DomLifecycle, GlobalCapabilityBinding, WebViewMessagePort};
//! use core_auth::AuthFlowController;
//!
//! let outcome = AuthFlowController::new(
//!     Arc::new(GlobalCapabilityBinding::default()),
//!     Arc::new(DomLifecycle::new()),
//!     Arc::new(WebViewMessagePort::default()),
//!     Default::default(),
//! )
//! .run()
//! .await;
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod bindings;
pub mod capability;
pub mod error;
pub mod lifecycle;
pub mod message_port;

// Re-export commonly used types
pub use capability::{GlobalCapabilityBinding, JsAuthCapability, DEFAULT_CAPABILITY_GLOBAL};
pub use error::{WasmError, WasmResult};
pub use lifecycle::DomLifecycle;
pub use message_port::WebViewMessagePort;
