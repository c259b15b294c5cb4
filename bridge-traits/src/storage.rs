//! Secure credential storage.

use crate::{error::Result, platform::PlatformSendSync};

/// Secure credential storage trait
///
/// Abstracts the native shell's encrypted key/value store:
/// - iOS: Keychain
/// - Android: EncryptedSharedPreferences (AES-256-GCM values, AES-256-SIV keys)
/// - Desktop: OS keyring (Keychain / Credential Manager / Secret Service)
///
/// The bridge uses a single namespace and a single key (`access_token`). The
/// page context never reads this store; only the native result handler and
/// the session status check touch it.
///
/// # Security Requirements
///
/// Implementations MUST:
/// - Encrypt data at rest
/// - Make `set_secret`, `get_secret` and `delete_secret` individually atomic
/// - Never log or expose secret values
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("access_token", token.as_bytes()).await
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SecureStore: PlatformSendSync {
    /// Store a secret value, overwriting any previous value for `key`.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Deleting a missing key succeeds.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}
