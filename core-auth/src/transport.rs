//! Native receiving end of the page → native channel.
//!
//! The webview delivers raw text to [`NativeBridgeTransport::receive`]. Text
//! that does not decode to a known envelope is dropped and reported on the
//! event bus; everything else goes to the [`NativeResultHandler`].
//!
//! Native hosts usually call [`NativeBridgeTransport::spawn`], which moves the
//! transport onto a single task. All messages, from whichever thread the
//! webview callback runs on, are then handled one at a time in arrival order.

use core_runtime::events::BridgeEvent;
use tracing::warn;

use crate::envelope::{BridgeEnvelope, EnvelopeError, EnvelopeKind};
use crate::handler::NativeResultHandler;
use crate::types::ScreenOutcome;

pub struct NativeBridgeTransport {
    handler: NativeResultHandler,
}

impl NativeBridgeTransport {
    pub fn new(handler: NativeResultHandler) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &NativeResultHandler {
        &self.handler
    }

    pub fn open_surface(&mut self) {
        self.handler.open_surface();
    }

    /// Decodes and dispatches one raw message.
    ///
    /// An `AUTH_SUCCESS` whose payload cannot be decoded still reaches the
    /// handler, which answers with an invalid-format error. Any other decode
    /// failure drops the message.
    pub async fn receive(&mut self, raw: &str) -> Option<ScreenOutcome> {
        match BridgeEnvelope::decode(raw) {
            Ok(envelope) => self.handler.handle(envelope).await,
            Err(EnvelopeError::InvalidPayload {
                kind: EnvelopeKind::AuthSuccess,
                reason,
            }) => self.handler.reject_invalid_success(&reason).await,
            Err(err) => {
                warn!(error = %err, raw_len = raw.len(), "Dropping bridge message");
                self.handler.events().emit_bridge(BridgeEvent::EnvelopeRejected {
                    reason: err.to_string(),
                });
                None
            }
        }
    }
}

/// Message queued for the transport task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxMessage {
    SurfaceOpened,
    /// Raw text from the `nativeBridge` handler.
    Envelope(String),
    /// Raw payload from the `consoleLog` handler.
    Console(String),
}

#[cfg(not(target_arch = "wasm32"))]
pub use inbox::BridgeInbox;

#[cfg(not(target_arch = "wasm32"))]
mod inbox {
    use super::*;
    use bridge_traits::{error::Result as BridgeResult, BridgeError, NativeMessagePort};
    use core_async::sync::mpsc;
    use tracing::debug;

    use crate::console::forward_console;

    /// Clonable handle feeding the transport task.
    #[derive(Clone, Debug)]
    pub struct BridgeInbox {
        tx: mpsc::UnboundedSender<InboxMessage>,
    }

    impl BridgeInbox {
        pub fn open_surface(&self) -> BridgeResult<()> {
            self.push(InboxMessage::SurfaceOpened)
        }

        pub fn deliver(&self, raw: impl Into<String>) -> BridgeResult<()> {
            self.push(InboxMessage::Envelope(raw.into()))
        }

        pub fn console(&self, raw: impl Into<String>) -> BridgeResult<()> {
            self.push(InboxMessage::Console(raw.into()))
        }

        fn push(&self, message: InboxMessage) -> BridgeResult<()> {
            self.tx
                .send(message)
                .map_err(|_| BridgeError::NotAvailable("bridge transport stopped".to_string()))
        }
    }

    /// Lets the page-side flow post straight into the inbox when both halves
    /// run in one process.
    impl NativeMessagePort for BridgeInbox {
        fn post_message(&self, message: &str) -> BridgeResult<()> {
            self.deliver(message)
        }
    }

    impl NativeBridgeTransport {
        /// Moves the transport onto its own task.
        ///
        /// Returns the inbox, a receiver of every outcome produced, and the
        /// task handle. The task ends once all inbox handles are dropped.
        pub fn spawn(
            mut self,
        ) -> (
            BridgeInbox,
            mpsc::UnboundedReceiver<ScreenOutcome>,
            core_async::task::JoinHandle<()>,
        ) {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

            let handle = core_async::spawn(async move {
                while let Some(message) = rx.recv().await {
                    match message {
                        InboxMessage::SurfaceOpened => self.open_surface(),
                        InboxMessage::Envelope(raw) => {
                            if let Some(outcome) = self.receive(&raw).await {
                                if outcome_tx.send(outcome).is_err() {
                                    debug!("Outcome receiver dropped");
                                }
                            }
                        }
                        InboxMessage::Console(raw) => {
                            forward_console(&raw);
                        }
                    }
                }
                debug!("Bridge inbox closed");
            });

            (BridgeInbox { tx }, outcome_rx, handle)
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use bridge_desktop::MemorySecureStore;
    use bridge_traits::{AuthUser, NativeMessagePort};
    use core_runtime::events::{CoreEvent, EventBus};
    use std::sync::Arc;

    use crate::token_store::CredentialStore;

    fn transport() -> (NativeBridgeTransport, MemorySecureStore, EventBus) {
        let backing = MemorySecureStore::new();
        let events = EventBus::new(16);
        let handler = NativeResultHandler::new(
            CredentialStore::new(Arc::new(backing.clone())),
            events.clone(),
        );
        (NativeBridgeTransport::new(handler), backing, events)
    }

    #[tokio::test]
    async fn test_malformed_text_is_dropped() {
        let (mut transport, backing, events) = transport();
        let mut rx = events.subscribe();
        transport.open_surface();

        assert!(transport.receive("{not json").await.is_none());
        assert!(transport
            .receive(r#"{"type":"AUTH_TELEPORTED","payload":{}}"#)
            .await
            .is_none());

        assert!(backing.is_empty());
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoreEvent::Auth(_)
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoreEvent::Bridge(BridgeEvent::EnvelopeRejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_success_without_user_id_reaches_handler() {
        let (mut transport, backing, _) = transport();
        transport.open_surface();

        let outcome = transport
            .receive(r#"{"type":"AUTH_SUCCESS","payload":{"token":"tok","user":{"email":"a@b.com"}}}"#)
            .await;

        assert_eq!(
            outcome,
            Some(ScreenOutcome::Error {
                message: "Invalid response format".to_string()
            })
        );
        assert!(backing.is_empty());
    }

    #[tokio::test]
    async fn test_spawned_inbox_serializes_messages() {
        let (transport, backing, _) = transport();
        let (inbox, mut outcomes, _task) = transport.spawn();

        inbox.open_surface().unwrap();
        inbox
            .console(r#"{"level":"info","message":"page ready"}"#)
            .unwrap();
        inbox
            .deliver(BridgeEnvelope::auth_started().encode().unwrap())
            .unwrap();
        inbox
            .post_message(
                &BridgeEnvelope::auth_success("tok123", AuthUser::new("u1"))
                    .encode()
                    .unwrap(),
            )
            .unwrap();

        let outcome = outcomes.recv().await.unwrap();
        assert!(matches!(outcome, ScreenOutcome::Success { .. }));
        assert_eq!(backing.len(), 1);
    }

    #[tokio::test]
    async fn test_inbox_reports_stopped_task() {
        let (transport, _, _) = transport();
        let (inbox, _outcomes, task) = transport.spawn();
        task.abort();
        let _ = task.await;

        assert!(inbox.deliver("{}").is_err());
    }
}
