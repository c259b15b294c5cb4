//! # Host Bridge Traits
//!
//! Contracts between the passkey bridge core and the two hosts it runs in.
//!
//! ## Overview
//!
//! The bridge spans a trust boundary: a web page inside an embedded browser
//! surface drives the passkey ceremony, and the native shell that opened the
//! surface receives the result. Neither side is implemented here. This crate
//! only names the capabilities the core needs from each host so that the
//! protocol logic can be exercised against fakes, desktop adapters, or the
//! browser bindings in `bridge-wasm`.
//!
//! ## Traits
//!
//! ### Page context
//! - [`CapabilityBinding`](capability::CapabilityBinding) - lookup of the
//!   third-party authentication object injected into the page
//! - [`AuthCapability`](capability::AuthCapability) - its async surface
//!   (login modal, private-key check, token retrieval)
//! - [`NativeMessagePort`](webview::NativeMessagePort) - one-way page → native
//!   message delivery
//! - [`DocumentLifecycle`](webview::DocumentLifecycle) - DOM readiness signal
//!
//! ### Native shell
//! - [`SecureStore`](storage::SecureStore) - encrypted-at-rest credential storage
//!   (Keychain / EncryptedSharedPreferences / OS keyring)
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Host | Implementation Crate |
//! |------|---------------------|
//! | Desktop / tests | `bridge-desktop` |
//! | Embedded page (wasm32) | `bridge-wasm` |
//! | iOS / Android shells | injected by the host over FFI |
//!
//! ## Thread Safety
//!
//! Native trait objects are `Send + Sync`. On `wasm32` the bounds collapse via
//! [`PlatformSendSync`](platform::PlatformSendSync) because browser handles are
//! single-threaded.

pub mod capability;
pub mod error;
pub mod logging;
pub mod platform;
pub mod storage;
pub mod webview;

pub use error::BridgeError;

pub use capability::{
    AuthCapability, AuthUser, CapabilityBinding, LoginEntry, LoginModalOptions, LoginModalResult,
};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use storage::SecureStore;
pub use webview::{DocumentLifecycle, DocumentReadyState, NativeMessagePort};
