//! Session status and logout.

use core_runtime::events::{AuthEvent, EventBus};
use tracing::{debug, info};

use crate::error::Result;
use crate::token_store::CredentialStore;
use crate::types::SessionStatus;

/// Native view of whether a credential is on the device.
#[derive(Clone, Debug)]
pub struct AuthSession {
    store: CredentialStore,
    events: EventBus,
}

impl AuthSession {
    pub fn new(store: CredentialStore, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Reads the stored token; called on every app resume.
    pub async fn status(&self) -> Result<SessionStatus> {
        let status = match self.store.access_token().await? {
            Some(token) if !token.is_empty() => SessionStatus::Authenticated {
                token_len: token.len(),
            },
            _ => SessionStatus::Unauthenticated,
        };
        debug!(?status, "Session status checked");
        Ok(status)
    }

    /// The stored token, for hosts that attach it to their own requests.
    pub async fn access_token(&self) -> Result<Option<String>> {
        self.store.access_token().await
    }

    /// Deletes the stored token. Logging out twice is not an error.
    pub async fn logout(&self) -> Result<()> {
        self.store.delete_access_token().await?;
        info!("User signed out");
        self.events.emit_auth(AuthEvent::SignedOut);
        Ok(())
    }
}
