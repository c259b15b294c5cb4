//! Third-party authentication capability contract.
//!
//! The capability is injected into the page by a vendor script on its own
//! schedule. Before it is fully initialised the global may exist as a stub
//! whose entry point only ever answers "not initialized"; callers never talk to
//! the raw global directly but go through a [`CapabilityBinding`], which lets
//! the poller observe the global without owning it.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Options for `openAuthLoginModal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginModalOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default = "default_show_branding_panel")]
    pub show_branding_panel: bool,
}

fn default_show_branding_panel() -> bool {
    true
}

impl Default for LoginModalOptions {
    fn default() -> Self {
        Self {
            project_id: None,
            show_branding_panel: true,
        }
    }
}

/// User identity as reported by the capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One entry of a successful modal result.
///
/// `token` may be absent or empty when the vendor defers token minting until
/// the private key has been provisioned on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEntry {
    #[serde(default)]
    pub token: Option<String>,
    pub user: AuthUser,
}

impl LoginEntry {
    /// The entry token, if it is present and non-empty.
    pub fn usable_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

/// Raw result of `openAuthLoginModal`.
///
/// `null` and a missing field decode the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginModalResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload: Vec<LoginEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The vendor authentication capability.
///
/// Every async method maps onto a promise-returning call on the global. An
/// `Err` carries the message of whatever the promise rejected with.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AuthCapability: PlatformSendSync {
    /// `openAuthLoginModal(options)`
    async fn open_auth_login_modal(&self, options: &LoginModalOptions)
        -> Result<LoginModalResult>;

    /// `token.hasPrivateKey()`
    async fn has_private_key(&self) -> Result<bool>;

    /// `token.getAccessToken()`; `Ok(None)` when the vendor returned null.
    async fn get_access_token(&self) -> Result<Option<String>>;

    /// Explicit readiness flag, when the vendor exposes one.
    ///
    /// `Some(false)` marks the global as a stub. `None` means the flag is not
    /// published and readiness has to be inferred from
    /// [`entry_point_signature`](Self::entry_point_signature).
    fn readiness(&self) -> Option<bool> {
        None
    }

    /// Source text of the `openAuthLoginModal` entry point, if it can be
    /// inspected.
    fn entry_point_signature(&self) -> Option<String> {
        None
    }
}

/// Late-bound access to the capability global.
///
/// `resolve` is cheap and side-effect free; it is called once per poll tick.
pub trait CapabilityBinding: PlatformSendSync {
    /// `None` while the global does not exist yet.
    fn resolve(&self) -> Option<Arc<dyn AuthCapability>>;
}
