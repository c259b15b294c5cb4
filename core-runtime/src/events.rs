//! # Event Bus System
//!
//! Broadcasts authentication lifecycle notifications on the native side using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The native result handler and the session publish [`CoreEvent`]s; the host
//! UI subscribes to learn when to close the embedded surface, show an error,
//! or route to the signed-in screen. Publishers never wait on subscribers.
//!
//! ```text
//! ┌──────────────────┐    emit     ┌───────────┐   subscribe   ┌─────────┐
//! │ NativeResult     ├────────────>│           ├──────────────>│ Host UI │
//! │ Handler          │             │ EventBus  │               └─────────┘
//! └──────────────────┘             │ (broadcast│
//! ┌──────────────────┐    emit     │  channel) │   subscribe   ┌─────────┐
//! │ AuthSession      ├────────────>│           ├──────────────>│ Metrics │
//! └──────────────────┘             └───────────┘               └─────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Auth(AuthEvent::SignedIn {
//!     user_id: "u1".to_string(),
//! }))
//! .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert!(event.closes_surface());
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events and can keep
//!   receiving.
//! - **`RecvError::Closed`**: every sender is gone; treat as shutdown.
//!
//! `emit` fails only when nobody is subscribed. Publishers ignore that.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Authentication lifecycle
    Auth(AuthEvent),
    /// Transport-level notices about the page → native channel
    Bridge(BridgeEvent),
}

impl CoreEvent {
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Bridge(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::RefreshFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Bridge(BridgeEvent::EnvelopeRejected { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::SignedIn { .. }) => EventSeverity::Info,
            CoreEvent::Auth(AuthEvent::SignedOut) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// `true` for events after which the embedded surface must be dismissed.
    pub fn closes_surface(&self) -> bool {
        matches!(
            self,
            CoreEvent::Auth(
                AuthEvent::SignedIn { .. } | AuthEvent::Cancelled | AuthEvent::AuthError { .. }
            )
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Authentication lifecycle events.
///
/// Token values never appear here; hosts read the token from the secure store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// The embedded auth surface was presented.
    SurfaceOpened,
    /// The page reported `AUTH_STARTED`.
    FlowStarted,
    /// Credential persisted; the user is signed in.
    SignedIn { user_id: String },
    /// The user dismissed the login modal.
    Cancelled,
    AuthError { message: String, recoverable: bool },
    /// A silent refresh stored a new token.
    TokenRefreshed,
    RefreshFailed {
        reason: String,
        message: Option<String>,
    },
    /// The stored credential was removed.
    SignedOut,
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SurfaceOpened => "Auth surface opened",
            AuthEvent::FlowStarted => "Authentication in progress",
            AuthEvent::SignedIn { .. } => "User signed in successfully",
            AuthEvent::Cancelled => "Authentication cancelled",
            AuthEvent::AuthError { .. } => "Authentication error",
            AuthEvent::TokenRefreshed => "Token refreshed successfully",
            AuthEvent::RefreshFailed { .. } => "Token refresh failed",
            AuthEvent::SignedOut => "User signed out",
        }
    }
}

// ============================================================================
// Bridge Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BridgeEvent {
    /// A raw page message could not be decoded and was dropped.
    EnvelopeRejected { reason: String },
    /// A message arrived for a flow that already reached a different
    /// terminal outcome and was ignored.
    StaleMessageIgnored { kind: String },
}

impl BridgeEvent {
    fn description(&self) -> &str {
        match self {
            BridgeEvent::EnvelopeRejected { .. } => "Bridge envelope rejected",
            BridgeEvent::StaleMessageIgnored { .. } => "Stale bridge message ignored",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus. Clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes `event` to all current subscribers.
    ///
    /// Returns the number of subscribers that received it, or an error when
    /// there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Publishes an [`AuthEvent`], ignoring the no-subscriber case.
    pub fn emit_auth(&self, event: AuthEvent) {
        let _ = self.emit(CoreEvent::Auth(event));
    }

    /// Publishes a [`BridgeEvent`], ignoring the no-subscriber case.
    pub fn emit_bridge(&self, event: BridgeEvent) {
        let _ = self.emit(CoreEvent::Bridge(event));
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let auth_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Auth(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv). `None` when nothing
    /// matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(CoreEvent::Auth(AuthEvent::SignedOut)).is_err());

        // The convenience helpers swallow the error
        bus.emit_auth(AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        bus.emit_auth(AuthEvent::SignedIn {
            user_id: "u1".to_string(),
        });

        let expected = CoreEvent::Auth(AuthEvent::SignedIn {
            user_id: "u1".to_string(),
        });
        assert_eq!(sub1.recv().await.unwrap(), expected);
        assert_eq!(sub2.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|event| matches!(event, CoreEvent::Auth(_)));

        bus.emit_bridge(BridgeEvent::EnvelopeRejected {
            reason: "malformed".to_string(),
        });
        bus.emit_auth(AuthEvent::Cancelled);

        assert_eq!(
            stream.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::Cancelled)
        );
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut stream = EventStream::new(bus.subscribe());

        for _ in 0..5 {
            bus.emit_auth(AuthEvent::FlowStarted);
        }

        assert!(matches!(stream.try_recv(), Some(Err(RecvError::Lagged(3)))));
        assert!(matches!(stream.try_recv(), Some(Ok(_))));
    }

    #[test]
    fn test_event_severity() {
        let error = CoreEvent::Auth(AuthEvent::AuthError {
            message: "Authentication failed".to_string(),
            recoverable: true,
        });
        assert_eq!(error.severity(), EventSeverity::Error);

        let rejected = CoreEvent::Bridge(BridgeEvent::EnvelopeRejected {
            reason: "unknown type".to_string(),
        });
        assert_eq!(rejected.severity(), EventSeverity::Warning);

        assert_eq!(
            CoreEvent::Auth(AuthEvent::FlowStarted).severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_terminal_events_close_surface() {
        assert!(CoreEvent::Auth(AuthEvent::Cancelled).closes_surface());
        assert!(CoreEvent::Auth(AuthEvent::SignedIn {
            user_id: "u1".to_string()
        })
        .closes_surface());
        assert!(!CoreEvent::Auth(AuthEvent::FlowStarted).closes_surface());
        assert!(!CoreEvent::Auth(AuthEvent::TokenRefreshed).closes_surface());
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = CoreEvent::Auth(AuthEvent::RefreshFailed {
            reason: "NO_PRIVATE_KEY".to_string(),
            message: None,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Auth");
        assert_eq!(json["payload"]["event"], "RefreshFailed");
        assert_eq!(json["payload"]["reason"], "NO_PRIVATE_KEY");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_description() {
        assert_eq!(
            CoreEvent::Auth(AuthEvent::SignedOut).description(),
            "User signed out"
        );
    }
}
