//! Native-side envelope handling.
//!
//! [`NativeResultHandler`] turns decoded envelopes into [`ScreenOutcome`]s,
//! persists credentials, and broadcasts [`AuthEvent`]s. It owns the per-flow
//! terminal guard:
//!
//! - the first terminal envelope moves the flow to `Terminal(kind)`;
//! - the same terminal kind delivered again returns the first outcome
//!   without touching the store or emitting a second event;
//! - a different terminal kind after that is ignored.
//!
//! [`open_surface`](NativeResultHandler::open_surface) starts a fresh flow.

use core_runtime::events::{AuthEvent, BridgeEvent, EventBus};
use core_runtime::logging::redact_if_sensitive;
use tracing::{debug, info, warn};

use crate::envelope::{
    AuthSuccessPayload, BridgeEnvelope, EnvelopeKind, RefreshFailedPayload, RefreshFailureReason,
    RefreshSuccessPayload, INVALID_RESPONSE_FORMAT,
};
use crate::error::AuthError;
use crate::token_store::CredentialStore;
use crate::types::{NativeFlowState, OutcomeKind, ScreenOutcome};

pub struct NativeResultHandler {
    store: CredentialStore,
    events: EventBus,
    state: NativeFlowState,
    settled: Option<ScreenOutcome>,
}

impl NativeResultHandler {
    pub fn new(store: CredentialStore, events: EventBus) -> Self {
        Self {
            store,
            events,
            state: NativeFlowState::Idle,
            settled: None,
        }
    }

    pub fn state(&self) -> NativeFlowState {
        self.state
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The host presented the embedded surface; any previous flow is over.
    pub fn open_surface(&mut self) {
        debug!(previous = ?self.state, "Opening auth surface");
        self.state = NativeFlowState::Opened;
        self.settled = None;
        self.events.emit_auth(AuthEvent::SurfaceOpened);
    }

    /// Handles one decoded envelope.
    ///
    /// Returns `None` for informational envelopes and for terminal envelopes
    /// rejected by the terminal guard.
    pub async fn handle(&mut self, envelope: BridgeEnvelope) -> Option<ScreenOutcome> {
        let kind = envelope.kind();
        debug!(kind = %kind, state = ?self.state, "Handling bridge envelope");

        if let Some(incoming) = terminal_kind(kind) {
            if let Admission::Replay(outcome) = self.admit(kind, incoming)? {
                return Some(outcome);
            }
        }

        match envelope {
            BridgeEnvelope::AuthStarted(_) => {
                self.on_started();
                None
            }
            BridgeEnvelope::AuthSuccess(payload) => Some(self.on_success(payload).await),
            BridgeEnvelope::AuthCancelled(_) => Some(self.finish(
                OutcomeKind::Cancelled,
                ScreenOutcome::Cancelled,
                None,
            )),
            BridgeEnvelope::AuthError(payload) => {
                let outcome = ScreenOutcome::Error {
                    message: payload.message_or_default(),
                };
                Some(self.finish(OutcomeKind::Error, outcome, None))
            }
            BridgeEnvelope::RefreshSuccess(payload) => Some(self.on_refresh_success(payload).await),
            BridgeEnvelope::RefreshFailed(payload) => Some(self.on_refresh_failed(payload)),
        }
    }

    /// `AUTH_SUCCESS` whose payload could not be decoded at all.
    ///
    /// Treated like a success without token or user id.
    pub async fn reject_invalid_success(&mut self, reason: &str) -> Option<ScreenOutcome> {
        warn!(%reason, "AUTH_SUCCESS payload could not be decoded");
        self.handle(BridgeEnvelope::AuthSuccess(AuthSuccessPayload::default()))
            .await
    }

    fn on_started(&mut self) {
        match self.state {
            NativeFlowState::Terminal(_) => {
                self.ignore_stale(EnvelopeKind::AuthStarted);
            }
            NativeFlowState::Started => debug!("AUTH_STARTED repeated"),
            NativeFlowState::Idle | NativeFlowState::Opened => {
                self.state = NativeFlowState::Started;
                info!("Page reported authentication started");
                self.events.emit_auth(AuthEvent::FlowStarted);
            }
        }
    }

    async fn on_success(&mut self, payload: AuthSuccessPayload) -> ScreenOutcome {
        let (token, user) = match payload.into_credential() {
            Ok(credential) => credential,
            Err(err) => {
                warn!(error = %err, "AUTH_SUCCESS missing token or user id");
                let outcome = ScreenOutcome::Error {
                    message: INVALID_RESPONSE_FORMAT.to_string(),
                };
                return self.finish(OutcomeKind::Success, outcome, Some(err));
            }
        };

        if let Err(err) = self.persist(&token).await {
            let outcome = ScreenOutcome::Error {
                message: err.to_string(),
            };
            return self.finish(OutcomeKind::Success, outcome, Some(err));
        }

        self.finish(
            OutcomeKind::Success,
            ScreenOutcome::Success { token, user },
            None,
        )
    }

    /// Writes the token and reads it back once.
    ///
    /// A failed read-back is logged; the write already succeeded.
    async fn persist(&self, token: &str) -> Result<(), AuthError> {
        self.store.save_access_token(token).await?;

        match read_back(token, self.store.access_token().await) {
            ReadBack::Verified => debug!(token_len = token.len(), "Stored token verified"),
            ReadBack::Missing => warn!("Stored token not found after save"),
            ReadBack::Mismatch => warn!("Stored token differs from the one just saved"),
            ReadBack::Unreadable(err) => warn!(error = %err, "Could not verify stored token"),
        }
        Ok(())
    }

    async fn on_refresh_success(&mut self, payload: RefreshSuccessPayload) -> ScreenOutcome {
        let token = match payload.token.filter(|token| !token.is_empty()) {
            Some(token) => token,
            None => {
                return self.on_refresh_failed(
                    RefreshFailedPayload::new(RefreshFailureReason::TokenGenerationFailed)
                        .with_message(INVALID_RESPONSE_FORMAT),
                )
            }
        };

        match self.store.save_access_token(&token).await {
            Ok(()) => {
                info!(token_len = token.len(), "Refreshed token stored");
                self.events.emit_auth(AuthEvent::TokenRefreshed);
                ScreenOutcome::Refreshed
            }
            Err(err) => self.on_refresh_failed(
                RefreshFailedPayload::new(RefreshFailureReason::Error).with_message(err.to_string()),
            ),
        }
    }

    fn on_refresh_failed(&mut self, payload: RefreshFailedPayload) -> ScreenOutcome {
        let RefreshFailedPayload { reason, message } = payload;
        warn!(%reason, message = ?message, "Silent refresh failed");
        self.events.emit_auth(AuthEvent::RefreshFailed {
            reason: reason.to_string(),
            message: message.clone(),
        });
        ScreenOutcome::RefreshFailed { reason, message }
    }

    /// Terminal guard; `None` drops the envelope.
    fn admit(&self, kind: EnvelopeKind, incoming: OutcomeKind) -> Option<Admission> {
        match (self.state, &self.settled) {
            (NativeFlowState::Terminal(current), Some(outcome)) if current == incoming => {
                debug!(kind = %kind, "Duplicate terminal envelope, replaying outcome");
                Some(Admission::Replay(outcome.clone()))
            }
            (NativeFlowState::Terminal(_), _) => {
                self.ignore_stale(kind);
                None
            }
            _ => Some(Admission::Fresh),
        }
    }

    fn ignore_stale(&self, kind: EnvelopeKind) {
        warn!(kind = %kind, state = ?self.state, "Ignoring envelope for a finished flow");
        self.events.emit_bridge(BridgeEvent::StaleMessageIgnored {
            kind: kind.to_string(),
        });
    }

    /// Records the terminal state and broadcasts the outcome.
    ///
    /// The state is keyed on the envelope kind, not the outcome, so a
    /// re-delivered `AUTH_SUCCESS` that failed validation or storage is
    /// still a duplicate and replays that failure.
    fn finish(
        &mut self,
        kind: OutcomeKind,
        outcome: ScreenOutcome,
        cause: Option<AuthError>,
    ) -> ScreenOutcome {
        self.state = NativeFlowState::Terminal(kind);
        self.settled = Some(outcome.clone());

        let event = match &outcome {
            ScreenOutcome::Success { user, .. } => {
                info!(
                    user_id = %user.id,
                    email = %user.email.as_deref().map(|email| redact_if_sensitive("email", email)).unwrap_or_default(),
                    "User signed in"
                );
                AuthEvent::SignedIn {
                    user_id: user.id.clone(),
                }
            }
            ScreenOutcome::Cancelled => {
                info!("Authentication cancelled");
                AuthEvent::Cancelled
            }
            ScreenOutcome::Error { message } => {
                warn!(%message, "Authentication failed");
                AuthEvent::AuthError {
                    message: message.clone(),
                    recoverable: cause.as_ref().map_or(true, AuthError::is_recoverable),
                }
            }
            ScreenOutcome::Refreshed | ScreenOutcome::RefreshFailed { .. } => return outcome,
        };
        self.events.emit_auth(event);

        outcome
    }
}

enum Admission {
    Fresh,
    Replay(ScreenOutcome),
}

#[derive(Debug, PartialEq, Eq)]
enum ReadBack {
    Verified,
    Missing,
    Mismatch,
    Unreadable(AuthError),
}

fn read_back(token: &str, read: Result<Option<String>, AuthError>) -> ReadBack {
    match read {
        Ok(Some(saved)) if saved == token => ReadBack::Verified,
        Ok(Some(_)) => ReadBack::Mismatch,
        Ok(None) => ReadBack::Missing,
        Err(err) => ReadBack::Unreadable(err),
    }
}

fn terminal_kind(kind: EnvelopeKind) -> Option<OutcomeKind> {
    match kind {
        EnvelopeKind::AuthSuccess => Some(OutcomeKind::Success),
        EnvelopeKind::AuthCancelled => Some(OutcomeKind::Cancelled),
        EnvelopeKind::AuthError => Some(OutcomeKind::Error),
        _ => None,
    }
}
