//! Bridge envelope codec.
//!
//! Every message crossing from the page to native code is a single JSON text
//! blob of the form `{ "type": "<KIND>", "payload": { ... } }`. Decoding is
//! done in two steps so that callers can tell text that is not an envelope at
//! all ([`EnvelopeError::Malformed`]) from a well-formed envelope of a kind
//! this build does not know ([`EnvelopeError::UnknownType`]).

use std::fmt;
use std::sync::Arc;

use bridge_traits::{webview::NativeMessagePort, AuthUser};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{trace, warn};

use crate::error::{non_empty_or_unknown, AuthError, Result};

/// Returned to native code when `AUTH_SUCCESS` lacks a token or user id.
pub const INVALID_RESPONSE_FORMAT: &str = "Invalid response format";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    #[error("Unknown envelope type: {0}")]
    UnknownType(String),

    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: EnvelopeKind, reason: String },

    #[error("Failed to encode envelope: {0}")]
    Encode(String),
}

/// Closed set of envelope kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    AuthStarted,
    AuthSuccess,
    AuthCancelled,
    AuthError,
    RefreshSuccess,
    RefreshFailed,
}

impl EnvelopeKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AUTH_STARTED" => Some(Self::AuthStarted),
            "AUTH_SUCCESS" => Some(Self::AuthSuccess),
            "AUTH_CANCELLED" => Some(Self::AuthCancelled),
            "AUTH_ERROR" => Some(Self::AuthError),
            "REFRESH_SUCCESS" => Some(Self::RefreshSuccess),
            "REFRESH_FAILED" => Some(Self::RefreshFailed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthStarted => "AUTH_STARTED",
            Self::AuthSuccess => "AUTH_SUCCESS",
            Self::AuthCancelled => "AUTH_CANCELLED",
            Self::AuthError => "AUTH_ERROR",
            Self::RefreshSuccess => "REFRESH_SUCCESS",
            Self::RefreshFailed => "REFRESH_FAILED",
        }
    }

    /// Whether this kind ends an interactive flow.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::AuthSuccess | Self::AuthCancelled | Self::AuthError
        )
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for kinds that carry nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyPayload {}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccessPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
}

impl AuthSuccessPayload {
    /// Splits the payload into its credential parts.
    ///
    /// Both the token and the user id must be present and non-empty.
    pub fn into_credential(self) -> Result<(String, AuthUser)> {
        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.is_empty() && !user.id.is_empty() => {
                Ok((token, user))
            }
            _ => Err(AuthError::InvalidResponse(
                INVALID_RESPONSE_FORMAT.to_string(),
            )),
        }
    }
}

impl fmt::Debug for AuthSuccessPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSuccessPayload")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthErrorPayload {
    /// The error text, or `"Unknown error"` when absent or blank.
    pub fn message_or_default(&self) -> String {
        non_empty_or_unknown(self.message.clone().unwrap_or_default())
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSuccessPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for RefreshSuccessPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshSuccessPayload")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Why a silent refresh produced no token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshFailureReason {
    SdkNotLoaded,
    NoPrivateKey,
    TokenGenerationFailed,
    Error,
    #[serde(other)]
    Unknown,
}

impl RefreshFailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SdkNotLoaded => "SDK_NOT_LOADED",
            Self::NoPrivateKey => "NO_PRIVATE_KEY",
            Self::TokenGenerationFailed => "TOKEN_GENERATION_FAILED",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RefreshFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshFailedPayload {
    pub reason: RefreshFailureReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RefreshFailedPayload {
    pub fn new(reason: RefreshFailureReason) -> Self {
        Self {
            reason,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A message from the page to native code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeEnvelope {
    AuthStarted(EmptyPayload),
    AuthSuccess(AuthSuccessPayload),
    AuthCancelled(EmptyPayload),
    AuthError(AuthErrorPayload),
    RefreshSuccess(RefreshSuccessPayload),
    RefreshFailed(RefreshFailedPayload),
}

impl BridgeEnvelope {
    pub fn auth_started() -> Self {
        Self::AuthStarted(EmptyPayload {})
    }

    pub fn auth_success(token: impl Into<String>, user: AuthUser) -> Self {
        Self::AuthSuccess(AuthSuccessPayload {
            token: Some(token.into()),
            user: Some(user),
        })
    }

    pub fn auth_cancelled() -> Self {
        Self::AuthCancelled(EmptyPayload {})
    }

    pub fn auth_error(message: impl Into<String>) -> Self {
        Self::AuthError(AuthErrorPayload {
            message: Some(message.into()),
        })
    }

    pub fn refresh_success(token: impl Into<String>) -> Self {
        Self::RefreshSuccess(RefreshSuccessPayload {
            token: Some(token.into()),
        })
    }

    pub fn refresh_failed(payload: RefreshFailedPayload) -> Self {
        Self::RefreshFailed(payload)
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Self::AuthStarted(_) => EnvelopeKind::AuthStarted,
            Self::AuthSuccess(_) => EnvelopeKind::AuthSuccess,
            Self::AuthCancelled(_) => EnvelopeKind::AuthCancelled,
            Self::AuthError(_) => EnvelopeKind::AuthError,
            Self::RefreshSuccess(_) => EnvelopeKind::RefreshSuccess,
            Self::RefreshFailed(_) => EnvelopeKind::RefreshFailed,
        }
    }

    /// Serializes the envelope to its wire text.
    pub fn encode(&self) -> std::result::Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Encode(e.to_string()))
    }

    /// Parses wire text into an envelope.
    ///
    /// A missing or `null` payload is read as `{}`; payload fields the kind
    /// does not define are ignored.
    pub fn decode(raw: &str) -> std::result::Result<Self, EnvelopeError> {
        let raw: RawEnvelope =
            serde_json::from_str(raw).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        let kind =
            EnvelopeKind::parse(&raw.kind).ok_or_else(|| EnvelopeError::UnknownType(raw.kind))?;
        let payload = match raw.payload {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(value) => value,
        };

        let envelope = match kind {
            EnvelopeKind::AuthStarted => Self::AuthStarted(payload_as(kind, payload)?),
            EnvelopeKind::AuthSuccess => Self::AuthSuccess(payload_as(kind, payload)?),
            EnvelopeKind::AuthCancelled => Self::AuthCancelled(payload_as(kind, payload)?),
            EnvelopeKind::AuthError => Self::AuthError(payload_as(kind, payload)?),
            EnvelopeKind::RefreshSuccess => Self::RefreshSuccess(payload_as(kind, payload)?),
            EnvelopeKind::RefreshFailed => Self::RefreshFailed(payload_as(kind, payload)?),
        };
        Ok(envelope)
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Value>,
}

fn payload_as<T: DeserializeOwned>(
    kind: EnvelopeKind,
    payload: Value,
) -> std::result::Result<T, EnvelopeError> {
    serde_json::from_value(payload).map_err(|e| EnvelopeError::InvalidPayload {
        kind,
        reason: e.to_string(),
    })
}

/// Page-side sender posting encoded envelopes through the host message port.
///
/// Sending is fire-and-forget: there is no acknowledgement, and a failed post
/// is logged and reported but never retried.
#[derive(Clone)]
pub struct EnvelopeSender {
    port: Arc<dyn NativeMessagePort>,
}

impl EnvelopeSender {
    pub fn new(port: Arc<dyn NativeMessagePort>) -> Self {
        Self { port }
    }

    pub fn send(&self, envelope: &BridgeEnvelope) -> Result<()> {
        let kind = envelope.kind();
        let text = envelope.encode()?;

        self.port.post_message(&text).map_err(|e| {
            warn!(kind = %kind, error = %e, "Failed to post envelope to native host");
            AuthError::BridgeUnavailable(e)
        })?;

        trace!(kind = %kind, "Envelope posted");
        Ok(())
    }
}

impl fmt::Debug for EnvelopeSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeSender").finish_non_exhaustive()
    }
}
