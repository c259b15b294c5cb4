//! Page-side authentication flow.
//!
//! [`AuthFlowController`] drives a single passkey sign-in on the embedded
//! page and reports the result to native code:
//!
//! ```text
//! await capability ──timeout──────────────────────────────► AUTH_ERROR
//!        │ ready
//!        ▼
//!   AUTH_STARTED ─► login modal ─► classify ─► extract token ─► AUTH_SUCCESS
//!                                     │              │
//!                                     │              └─exhausted─► AUTH_ERROR
//!                                     └─dismissed─► AUTH_CANCELLED
//! ```
//!
//! Exactly one terminal envelope is posted per run. `run` consumes the
//! controller, so a page load cannot start a second flow on the same
//! instance.

use std::sync::Arc;

use bridge_traits::{
    AuthCapability, CapabilityBinding, DocumentLifecycle, LoginModalOptions, LoginModalResult,
    NativeMessagePort,
};
use core_async::retry::{poll_until, PollError, Probe, RetryPolicy};
use core_runtime::config::FlowSettings;
use tracing::{debug, info, instrument, warn};

use crate::envelope::{BridgeEnvelope, EnvelopeSender};
use crate::error::{non_empty_or_unknown, AuthError, Result};
use crate::poller::CapabilityPoller;
use crate::types::AuthOutcome;

/// Reported when the modal fails without saying why.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// Classification of a raw modal result before token extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalVerdict {
    /// `success == false`, no error and an empty payload.
    Dismissed,
    /// Any other failure shape, with the message to report.
    Failed(String),
    /// `success == true`; extraction proceeds on the first entry only.
    Accepted(bridge_traits::LoginEntry),
}

impl ModalVerdict {
    pub fn classify(result: LoginModalResult) -> Self {
        let LoginModalResult {
            success,
            payload,
            error,
        } = result;

        if !success && error.is_none() && payload.is_empty() {
            return ModalVerdict::Dismissed;
        }

        match payload.into_iter().next() {
            Some(entry) if success => ModalVerdict::Accepted(entry),
            _ => ModalVerdict::Failed(
                error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| AUTHENTICATION_FAILED.to_string()),
            ),
        }
    }
}

pub struct AuthFlowController {
    poller: CapabilityPoller,
    sender: EnvelopeSender,
    settings: FlowSettings,
}

impl AuthFlowController {
    pub fn new(
        binding: Arc<dyn CapabilityBinding>,
        lifecycle: Arc<dyn DocumentLifecycle>,
        port: Arc<dyn NativeMessagePort>,
        settings: FlowSettings,
    ) -> Self {
        Self {
            poller: CapabilityPoller::new(binding, lifecycle, settings.settle_delay),
            sender: EnvelopeSender::new(port),
            settings,
        }
    }

    /// Runs the flow to completion and posts its terminal envelope.
    ///
    /// The returned outcome mirrors what was posted. Posting failures are
    /// logged; the outcome is still returned.
    #[instrument(skip_all, name = "auth_flow")]
    pub async fn run(mut self) -> AuthOutcome {
        let outcome = match self.poller.await_ready(self.settings.capability_poll).await {
            Ok(capability) => self.authenticate(capability).await,
            Err(err) => AuthOutcome::from_error(&err),
        };

        match &outcome {
            AuthOutcome::Success { token, user } => {
                info!(user_id = %user.id, token_len = token.len(), "Authentication succeeded")
            }
            AuthOutcome::Cancelled => info!("Authentication cancelled by user"),
            AuthOutcome::Error { message } => warn!(%message, "Authentication failed"),
        }

        self.post(&outcome.to_envelope());
        outcome
    }

    async fn authenticate(&self, capability: Arc<dyn AuthCapability>) -> AuthOutcome {
        self.post(&BridgeEnvelope::auth_started());

        let options = LoginModalOptions {
            project_id: self.settings.project_id.clone(),
            show_branding_panel: self.settings.show_branding_panel,
        };

        let result = match capability.open_auth_login_modal(&options).await {
            Ok(result) => result,
            Err(err) => {
                return AuthOutcome::from_error(&AuthError::ModalFailed(non_empty_or_unknown(
                    err.to_string(),
                )))
            }
        };

        let entry = match ModalVerdict::classify(result) {
            ModalVerdict::Dismissed => return AuthOutcome::Cancelled,
            ModalVerdict::Failed(message) => {
                return AuthOutcome::from_error(&AuthError::ModalFailed(message))
            }
            ModalVerdict::Accepted(entry) => entry,
        };

        let token = match entry.usable_token() {
            Some(token) => Ok(token.to_string()),
            None => {
                debug!("Modal returned no token; waiting for the private key");
                self.await_token(capability.as_ref()).await
            }
        };

        match token {
            Ok(token) => AuthOutcome::Success {
                token,
                user: entry.user,
            },
            Err(err) => AuthOutcome::from_error(&err),
        }
    }

    /// Waits for the private key, then for a non-empty access token.
    async fn await_token(&self, capability: &dyn AuthCapability) -> Result<String> {
        wait_for_private_key(capability, self.settings.private_key_poll).await?;
        wait_for_access_token(capability, self.settings.token_poll).await
    }

    fn post(&self, envelope: &BridgeEnvelope) {
        // Delivery is fire-and-forget; the sender already logged the failure.
        let _ = self.sender.send(envelope);
    }
}

/// Polls `hasPrivateKey` until it reports `true`.
///
/// A rejection ends the wait immediately with its message.
pub async fn wait_for_private_key(capability: &dyn AuthCapability, policy: RetryPolicy) -> Result<()> {
    let result = poll_until(policy, |attempt| async move {
        match capability.has_private_key().await {
            Ok(true) => Probe::Ready(()),
            Ok(false) => {
                debug!(attempt, "Private key not ready yet");
                Probe::Pending
            }
            Err(err) => Probe::Abort(non_empty_or_unknown(err.to_string())),
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(PollError::Exhausted { attempts }) => Err(AuthError::PrivateKeyUnavailable { attempts }),
        Err(PollError::Aborted { reason, .. }) => Err(AuthError::Capability(reason)),
    }
}

/// Polls `getAccessToken` until it yields a non-empty token.
///
/// Rejections count as failed attempts.
pub async fn wait_for_access_token(
    capability: &dyn AuthCapability,
    policy: RetryPolicy,
) -> Result<String> {
    let result = poll_until(policy, |attempt| async move {
        match capability.get_access_token().await {
            Ok(Some(token)) if !token.is_empty() => Probe::Ready(token),
            Ok(_) => {
                debug!(attempt, "Access token not available yet");
                Probe::Pending
            }
            Err(err) => {
                debug!(attempt, error = %err, "getAccessToken failed");
                Probe::Pending
            }
        }
    })
    .await;

    result.map_err(|err| match err {
        PollError::Exhausted { attempts } | PollError::Aborted { attempt: attempts, .. } => {
            AuthError::TokenUnavailable { attempts }
        }
    })
}
