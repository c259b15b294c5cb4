//! Native host entry point.
//!
//! [`NativeBridge`] wires the credential store, event bus, session and
//! transport together from a validated [`BridgeConfig`]. A host typically:
//!
//! 1. builds a `BridgeConfig` and calls [`NativeBridge::from_config`];
//! 2. checks [`session().status()`](crate::AuthSession::status) on resume;
//! 3. when sign-in is needed, loads [`auth_page_url`](NativeBridge::auth_page_url)
//!    in a webview with [`CONSOLE_CAPTURE_SCRIPT`] injected, and routes the
//!    [`BRIDGE_HANDLER_NAME`] / [`CONSOLE_HANDLER_NAME`] callbacks into the
//!    inbox returned by [`start`](NativeBridge::start);
//! 4. dismisses the surface when an outcome with
//!    [`closes_surface`](crate::ScreenOutcome::closes_surface) arrives.

use core_runtime::config::{BridgeConfig, FlowSettings};
use core_runtime::events::{EventBus, EventStream};
use tracing::info;

use crate::console::{BRIDGE_HANDLER_NAME, CONSOLE_CAPTURE_SCRIPT, CONSOLE_HANDLER_NAME};
use crate::handler::NativeResultHandler;
use crate::session::AuthSession;
use crate::token_store::CredentialStore;
use crate::transport::NativeBridgeTransport;

pub struct NativeBridge {
    config: BridgeConfig,
    store: CredentialStore,
    events: EventBus,
}

impl NativeBridge {
    pub fn from_config(config: BridgeConfig) -> core_runtime::Result<Self> {
        config.validate()?;

        let store = CredentialStore::new(config.secure_store.clone());
        let events = EventBus::new(config.event_buffer);

        info!(auth_page_url = %config.auth_page_url, "Native bridge configured");
        Ok(Self {
            config,
            store,
            events,
        })
    }

    pub fn auth_page_url(&self) -> &str {
        self.config.auth_page_url.as_str()
    }

    /// Settings to hand to the page-side flow.
    pub fn flow_settings(&self) -> FlowSettings {
        self.config.flow_settings()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn session(&self) -> AuthSession {
        AuthSession::new(self.store.clone(), self.events.clone())
    }

    /// A transport with a fresh handler, for hosts that drive delivery
    /// themselves.
    pub fn transport(&self) -> NativeBridgeTransport {
        NativeBridgeTransport::new(NativeResultHandler::new(
            self.store.clone(),
            self.events.clone(),
        ))
    }

    pub fn bridge_handler_name(&self) -> &'static str {
        BRIDGE_HANDLER_NAME
    }

    pub fn console_handler_name(&self) -> &'static str {
        CONSOLE_HANDLER_NAME
    }

    /// Script to inject at document start so page console output reaches
    /// native logs.
    pub fn console_capture_script(&self) -> &'static str {
        CONSOLE_CAPTURE_SCRIPT
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl NativeBridge {
    /// Spawns the transport task.
    pub fn start(
        &self,
    ) -> (
        crate::transport::BridgeInbox,
        core_async::sync::mpsc::UnboundedReceiver<crate::types::ScreenOutcome>,
        core_async::task::JoinHandle<()>,
    ) {
        self.transport().spawn()
    }
}

impl std::fmt::Debug for NativeBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBridge")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use bridge_desktop::MemorySecureStore;
    use bridge_traits::AuthUser;
    use std::sync::Arc;

    use crate::envelope::BridgeEnvelope;
    use crate::types::{ScreenOutcome, SessionStatus};

    fn bridge() -> NativeBridge {
        let config = BridgeConfig::builder()
            .auth_page_url("https://auth.example.com/login")
            .secure_store(Arc::new(MemorySecureStore::new()))
            .build()
            .unwrap();
        NativeBridge::from_config(config).unwrap()
    }

    #[test]
    fn test_exposes_page_wiring() {
        let bridge = bridge();
        assert_eq!(bridge.auth_page_url(), "https://auth.example.com/login");
        assert_eq!(bridge.bridge_handler_name(), "nativeBridge");
        assert_eq!(bridge.console_handler_name(), "consoleLog");
        assert!(bridge.flow_settings().show_branding_panel);
    }

    #[tokio::test]
    async fn test_sign_in_then_logout() {
        let bridge = bridge();
        let session = bridge.session();
        let (inbox, mut outcomes, _task) = bridge.start();

        inbox.open_surface().unwrap();
        inbox
            .deliver(
                BridgeEnvelope::auth_success("tok123", AuthUser::new("u1"))
                    .encode()
                    .unwrap(),
            )
            .unwrap();

        let outcome = outcomes.recv().await.unwrap();
        assert!(matches!(outcome, ScreenOutcome::Success { .. }));
        assert_eq!(
            session.status().await.unwrap(),
            SessionStatus::Authenticated { token_len: 6 }
        );

        session.logout().await.unwrap();
        assert_eq!(
            session.status().await.unwrap(),
            SessionStatus::Unauthenticated
        );
    }
}
