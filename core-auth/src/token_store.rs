//! Secure Token Storage
//!
//! Native-side persistence for the access token, on top of the host's
//! [`SecureStore`] (Keychain, EncryptedSharedPreferences, OS keyring).
//!
//! ## Security Features
//!
//! - Token values are never logged; only their length
//! - Values are stored as opaque UTF-8 under a single key
//! - Corrupted entries are erased on read
//! - Storage failures are audited without exposing the value
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::CredentialStore;
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let store = CredentialStore::new(secure_store);
//!
//! store.save_access_token("tok123").await?;
//! assert_eq!(store.access_token().await?.as_deref(), Some("tok123"));
//! store.delete_access_token().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bridge_traits::storage::SecureStore;
use tracing::{debug, info, warn};

use crate::error::{AuthError, Result};

/// The only key the bridge writes.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// String-valued view over a [`SecureStore`].
///
/// Writes overwrite, reads of a missing key return `None`, and deleting a
/// missing key succeeds.
#[derive(Clone)]
pub struct CredentialStore {
    secure_store: Arc<dyn SecureStore>,
}

impl CredentialStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        debug!("Initializing CredentialStore");
        Self { secure_store }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.secure_store
            .set_secret(key, value.as_bytes())
            .await
            .map_err(|e| {
                warn!(key, error = %e, "Failed to write secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        debug!(key, value_len = value.len(), "Secure value stored");
        Ok(())
    }

    /// Reads the value under `key`.
    ///
    /// A value that is not valid UTF-8 is deleted and reported as
    /// [`AuthError::CredentialCorrupted`].
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let data = self.secure_store.get_secret(key).await.map_err(|e| {
            warn!(key, error = %e, "Failed to read secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(key, "No value in secure storage");
            return Ok(None);
        };

        match String::from_utf8(data) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Stored value is not valid UTF-8, erasing it");

                if let Err(delete_err) = self.secure_store.delete_secret(key).await {
                    warn!(key, error = %delete_err, "Failed to erase corrupted value");
                }

                Err(AuthError::CredentialCorrupted(e.to_string()))
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.secure_store.delete_secret(key).await.map_err(|e| {
            warn!(key, error = %e, "Failed to delete from secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        debug!(key, "Secure value deleted");
        Ok(())
    }

    pub async fn save_access_token(&self, token: &str) -> Result<()> {
        self.save(ACCESS_TOKEN_KEY, token).await?;
        info!(token_len = token.len(), "Access token stored securely");
        Ok(())
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        self.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn delete_access_token(&self) -> Result<()> {
        self.delete(ACCESS_TOKEN_KEY).await?;
        info!("Access token deleted");
        Ok(())
    }

    /// Existence check that does not read the value.
    pub async fn has_access_token(&self) -> Result<bool> {
        self.secure_store
            .has_secret(ACCESS_TOKEN_KEY)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to check secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("secure_store", &"SecureStore { ... }")
            .finish()
    }
}
