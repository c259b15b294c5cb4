//! # Passkey Bridge Protocol
//!
//! Both halves of the embedded-page sign-in bridge.
//!
//! ## Overview
//!
//! A native app opens a web page in an embedded browser surface. The page
//! waits for a third-party passkey capability to load, runs its login modal,
//! obtains an access token and posts the result back over the webview
//! message channel as a [`BridgeEnvelope`]. Native code decodes the envelope,
//! stores the token in secure storage and tells the hosting screen how the
//! flow ended.
//!
//! ## Page side
//!
//! - [`CapabilityPoller`] - bounded wait for the capability to become live
//! - [`AuthFlowController`] - one interactive sign-in, one terminal envelope
//! - [`SilentRefresh`] - headless token refresh
//! - [`EnvelopeSender`] - posts envelopes through the host message port
//!
//! ## Native side
//!
//! - [`NativeBridgeTransport`] - decodes raw messages, drops bad ones
//! - [`NativeResultHandler`] - terminal guard, persistence, events
//! - [`CredentialStore`] - the `access_token` entry in secure storage
//! - [`AuthSession`] - status on resume and logout
//! - [`NativeBridge`] - wires the above from a `BridgeConfig`
//!
//! ## Security
//!
//! Token values never appear in logs, events or `Debug` output; only their
//! length is recorded.

pub mod console;
pub mod envelope;
pub mod error;
pub mod flow;
pub mod handler;
pub mod native;
pub mod poller;
pub mod refresh;
pub mod session;
pub mod token_store;
pub mod transport;
pub mod types;

pub use console::{forward_console, ConsoleMessage, CONSOLE_CAPTURE_SCRIPT};
pub use envelope::{
    BridgeEnvelope, EnvelopeError, EnvelopeKind, EnvelopeSender, RefreshFailedPayload,
    RefreshFailureReason,
};
pub use error::{AuthError, Result};
pub use flow::{AuthFlowController, ModalVerdict};
pub use handler::NativeResultHandler;
pub use native::NativeBridge;
pub use poller::CapabilityPoller;
pub use refresh::SilentRefresh;
pub use session::AuthSession;
pub use token_store::{CredentialStore, ACCESS_TOKEN_KEY};
#[cfg(not(target_arch = "wasm32"))]
pub use transport::BridgeInbox;
pub use transport::{InboxMessage, NativeBridgeTransport};
pub use types::{
    AuthOutcome, CapabilityState, NativeFlowState, OutcomeKind, ScreenOutcome, ScreenResult,
    SessionStatus,
};
