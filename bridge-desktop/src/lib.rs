//! # Desktop Bridge Implementations
//!
//! Host adapters for running the passkey bridge outside a phone: desktop
//! shells, integration tests, and headless tooling (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `KeyringSecureStore` - `SecureStore` on the OS keyring (`keyring` crate)
//! - `MemorySecureStore` - `SecureStore` on a process-local map
//! - `ChannelMessagePort` - `NativeMessagePort` over a Tokio channel, so the
//!   page-side flow can feed the native transport in-process
//! - `StaticDocumentLifecycle` - `DocumentLifecycle` the host flips by hand
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ChannelMessagePort, KeyringSecureStore};
//!
//! let store = KeyringSecureStore::new();
//! let (port, native_rx) = ChannelMessagePort::new();
//! ```

mod lifecycle;
mod memory_store;
mod message_port;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use lifecycle::StaticDocumentLifecycle;
pub use memory_store::MemorySecureStore;
pub use message_port::ChannelMessagePort;

#[cfg(feature = "secure-store")]
pub use secure_store::{KeyringSecureStore, DEFAULT_SERVICE_NAME};
