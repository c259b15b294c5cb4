use bridge_traits::BridgeError;
use thiserror::Error;

use crate::envelope::EnvelopeError;
use crate::types::CapabilityState;

/// Fallback text when a failure carries no message of its own.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Timeout: authentication SDK not ready after {attempts} checks (last state: {last_state})")]
    CapabilityTimeout {
        attempts: u32,
        last_state: CapabilityState,
    },

    /// The login modal reported failure or returned nothing usable.
    #[error("{0}")]
    ModalFailed(String),

    #[error("Token not available after authentication: private key was not ready after {attempts} checks")]
    PrivateKeyUnavailable { attempts: u32 },

    #[error("Token not available after authentication: private key is present but no token after {attempts} attempts")]
    TokenUnavailable { attempts: u32 },

    /// A capability call rejected; carries the rejection message.
    #[error("{0}")]
    Capability(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("Native bridge unavailable: {0}")]
    BridgeUnavailable(#[from] BridgeError),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Stored credential is corrupted: {0}")]
    CredentialCorrupted(String),

    #[error("{0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Builds a [`AuthError::Capability`] from a host rejection, substituting
    /// [`UNKNOWN_ERROR`] for an empty message.
    pub fn from_rejection(err: &BridgeError) -> Self {
        AuthError::Capability(non_empty_or_unknown(err.to_string()))
    }

    /// Whether running the flow again can reasonably succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AuthError::Envelope(_) | AuthError::CredentialCorrupted(_)
        )
    }
}

pub(crate) fn non_empty_or_unknown(message: String) -> String {
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
