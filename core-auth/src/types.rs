//! Bridge domain types shared by the page-side flow and the native handler.

use std::fmt;

use bridge_traits::AuthUser;
use serde::{Deserialize, Serialize};

use crate::envelope::{BridgeEnvelope, RefreshFailureReason};
use crate::error::AuthError;

/// Readiness of the vendor capability global, as seen by the poller.
///
/// Ordered: a page load only ever moves forward through these states.
///
/// ```
/// use core_auth::CapabilityState;
///
/// let state = CapabilityState::StubPresent;
/// assert_eq!(state.advance(CapabilityState::Absent), CapabilityState::StubPresent);
/// assert_eq!(state.advance(CapabilityState::Ready), CapabilityState::Ready);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CapabilityState {
    /// The global does not exist yet.
    #[default]
    Absent,
    /// The global exists but its entry point is a placeholder.
    StubPresent,
    /// Operations are live. Final for the page's lifetime.
    Ready,
}

impl CapabilityState {
    /// Folds a fresh observation into the current state without moving
    /// backwards.
    pub fn advance(self, observed: CapabilityState) -> CapabilityState {
        self.max(observed)
    }

    pub fn is_ready(self) -> bool {
        self == CapabilityState::Ready
    }
}

impl fmt::Display for CapabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityState::Absent => write!(f, "Absent"),
            CapabilityState::StubPresent => write!(f, "StubPresent"),
            CapabilityState::Ready => write!(f, "Ready"),
        }
    }
}

/// Terminal outcome of one authentication flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    Success,
    Cancelled,
    Error,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "Success"),
            OutcomeKind::Cancelled => write!(f, "Cancelled"),
            OutcomeKind::Error => write!(f, "Error"),
        }
    }
}

/// Result of one page-side authentication attempt.
///
/// Built once by the flow controller and rendered into exactly one terminal
/// envelope. Only `Success` carries a credential.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success { token: String, user: AuthUser },
    Cancelled,
    Error { message: String },
}

impl AuthOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        AuthOutcome::Error {
            message: message.into(),
        }
    }

    pub fn from_error(err: &AuthError) -> Self {
        AuthOutcome::error(err.to_string())
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            AuthOutcome::Success { .. } => OutcomeKind::Success,
            AuthOutcome::Cancelled => OutcomeKind::Cancelled,
            AuthOutcome::Error { .. } => OutcomeKind::Error,
        }
    }

    /// The terminal envelope announcing this outcome to native code.
    pub fn to_envelope(&self) -> BridgeEnvelope {
        match self {
            AuthOutcome::Success { token, user } => {
                BridgeEnvelope::auth_success(token.clone(), user.clone())
            }
            AuthOutcome::Cancelled => BridgeEnvelope::auth_cancelled(),
            AuthOutcome::Error { message } => BridgeEnvelope::auth_error(message.clone()),
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthOutcome::Success { token, user } => f
                .debug_struct("Success")
                .field("token", &format_args!("[REDACTED; {} chars]", token.len()))
                .field("user_id", &user.id)
                .finish(),
            AuthOutcome::Cancelled => f.write_str("Cancelled"),
            AuthOutcome::Error { message } => {
                f.debug_struct("Error").field("message", message).finish()
            }
        }
    }
}

/// Text shown for a cancelled flow when the host collapses cancel and error.
pub const CANCELLED_MESSAGE: &str = "Authentication cancelled";

/// UI-independent outcome handed to the screen hosting the embedded surface.
#[derive(Clone, PartialEq, Eq)]
pub enum ScreenOutcome {
    Success { token: String, user: AuthUser },
    Cancelled,
    Error { message: String },
    /// A silent refresh stored a new token.
    Refreshed,
    RefreshFailed {
        reason: RefreshFailureReason,
        message: Option<String>,
    },
}

impl ScreenOutcome {
    /// Interactive outcomes dismiss the embedded surface. Refresh runs on a
    /// headless page and leaves surface handling to the host.
    pub fn closes_surface(&self) -> bool {
        matches!(
            self,
            ScreenOutcome::Success { .. } | ScreenOutcome::Cancelled | ScreenOutcome::Error { .. }
        )
    }

    /// Flow outcome kind, for interactive outcomes only.
    pub fn kind(&self) -> Option<OutcomeKind> {
        match self {
            ScreenOutcome::Success { .. } => Some(OutcomeKind::Success),
            ScreenOutcome::Cancelled => Some(OutcomeKind::Cancelled),
            ScreenOutcome::Error { .. } => Some(OutcomeKind::Error),
            ScreenOutcome::Refreshed | ScreenOutcome::RefreshFailed { .. } => None,
        }
    }

    /// Collapses the outcome into the external `{ token, user }` /
    /// `{ error }` shape.
    pub fn to_screen_result(&self) -> ScreenResult {
        match self {
            ScreenOutcome::Success { token, user } => ScreenResult {
                token: Some(token.clone()),
                user: Some(user.clone()),
                error: None,
            },
            ScreenOutcome::Cancelled => ScreenResult::failure(CANCELLED_MESSAGE),
            ScreenOutcome::Error { message } => ScreenResult::failure(message.clone()),
            ScreenOutcome::Refreshed => ScreenResult::default(),
            ScreenOutcome::RefreshFailed { reason, message } => {
                ScreenResult::failure(message.clone().unwrap_or_else(|| reason.to_string()))
            }
        }
    }
}

impl fmt::Debug for ScreenOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenOutcome::Success { token, user } => f
                .debug_struct("Success")
                .field("token", &format_args!("[REDACTED; {} chars]", token.len()))
                .field("user_id", &user.id)
                .finish(),
            ScreenOutcome::Cancelled => f.write_str("Cancelled"),
            ScreenOutcome::Error { message } => {
                f.debug_struct("Error").field("message", message).finish()
            }
            ScreenOutcome::Refreshed => f.write_str("Refreshed"),
            ScreenOutcome::RefreshFailed { reason, message } => f
                .debug_struct("RefreshFailed")
                .field("reason", reason)
                .field("message", message)
                .finish(),
        }
    }
}

/// External screen result: `{ token, user }` on success, `{ error }` otherwise.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScreenResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            token: None,
            user: None,
            error: Some(message.into()),
        }
    }
}

impl fmt::Debug for ScreenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenResult")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .field("error", &self.error)
            .finish()
    }
}

/// Flow lifecycle as observed by native code.
///
/// ```text
/// Idle -> Opened -> Started -> Terminal(Success | Cancelled | Error)
/// ```
///
/// `Terminal` is absorbing until the host opens the surface again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeFlowState {
    #[default]
    Idle,
    Opened,
    Started,
    Terminal(OutcomeKind),
}

impl NativeFlowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NativeFlowState::Terminal(_))
    }
}

/// Session status read from the secure store on app resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated { token_len: usize },
    Unauthenticated,
}

impl SessionStatus {
    pub fn is_authenticated(self) -> bool {
        matches!(self, SessionStatus::Authenticated { .. })
    }
}
