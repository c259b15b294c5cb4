//! # Bridge Configuration Module
//!
//! Configuration for both halves of the passkey bridge.
//!
//! ## Overview
//!
//! [`BridgeConfig`] is built once by the native shell with a builder and
//! validated fail-fast. It carries the embedded page location, the options
//! passed to the vendor login modal, the bounded-wait policies used by the
//! page-side flow, and the secure store the native handler persists into.
//!
//! [`FlowSettings`] is the page-side subset. The page never sees the secure
//! store, so it can be built on its own (`FlowSettings::default()`) or derived
//! from a full config with [`BridgeConfig::flow_settings`].
//!
//! ## Required Dependencies
//!
//! - `auth_page_url` - where the embedded surface loads the auth page
//! - `SecureStore` - credential persistence. With the `desktop-shims`
//!   feature, `KeyringSecureStore` is injected when none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .auth_page_url("https://auth.example.com/mobile")
//!     .project_id("proj_123")
//!     .secure_store(Arc::new(MySecureStore))
//!     .build()?;
//! ```
//!
//! Hosts that are configured through the environment can start from
//! [`BridgeConfigBuilder::from_env`], which reads `PASSKEY_BRIDGE_AUTH_URL`
//! and `PASSKEY_BRIDGE_PROJECT_ID`.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::SecureStore;
use core_async::retry::RetryPolicy;
use core_async::time::Duration;
use std::sync::Arc;
use url::Url;

/// Environment variable holding the auth page URL.
pub const ENV_AUTH_URL: &str = "PASSKEY_BRIDGE_AUTH_URL";
/// Environment variable holding the vendor project id.
pub const ENV_PROJECT_ID: &str = "PASSKEY_BRIDGE_PROJECT_ID";

/// Capability global lookup: 30 checks, 200 ms apart.
pub const DEFAULT_CAPABILITY_POLL: RetryPolicy = RetryPolicy::from_millis(200, 30);
/// `hasPrivateKey` wait after a modal success without token: 25 × 200 ms.
pub const DEFAULT_PRIVATE_KEY_POLL: RetryPolicy = RetryPolicy::from_millis(200, 25);
/// `getAccessToken` wait once the key exists: 25 × 200 ms.
pub const DEFAULT_TOKEN_POLL: RetryPolicy = RetryPolicy::from_millis(200, 25);
/// Delay before the first capability check when the DOM is already parsed.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Page-side flow settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    /// Vendor project id passed to `openAuthLoginModal`
    pub project_id: Option<String>,
    /// Whether the vendor modal shows its branding panel
    pub show_branding_panel: bool,
    pub capability_poll: RetryPolicy,
    pub private_key_poll: RetryPolicy,
    pub token_poll: RetryPolicy,
    pub settle_delay: Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            project_id: None,
            show_branding_panel: true,
            capability_poll: DEFAULT_CAPABILITY_POLL,
            private_key_poll: DEFAULT_PRIVATE_KEY_POLL,
            token_poll: DEFAULT_TOKEN_POLL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl FlowSettings {
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_branding_panel(mut self, show: bool) -> Self {
        self.show_branding_panel = show;
        self
    }

    pub fn with_capability_poll(mut self, policy: RetryPolicy) -> Self {
        self.capability_poll = policy;
        self
    }

    pub fn with_private_key_poll(mut self, policy: RetryPolicy) -> Self {
        self.private_key_poll = policy;
        self
    }

    pub fn with_token_poll(mut self, policy: RetryPolicy) -> Self {
        self.token_poll = policy;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Validates the bounded waits.
    ///
    /// Every wait must have at least one attempt; a zero interval is accepted
    /// only for the settle delay.
    pub fn validate(&self) -> Result<()> {
        if let Some(project_id) = &self.project_id {
            if project_id.trim().is_empty() {
                return Err(Error::Config(
                    "Project id cannot be empty. Omit it instead.".to_string(),
                ));
            }
        }

        for (name, policy) in [
            ("capability_poll", &self.capability_poll),
            ("private_key_poll", &self.private_key_poll),
            ("token_poll", &self.token_poll),
        ] {
            if policy.max_attempts == 0 {
                return Err(Error::Config(format!(
                    "{} must allow at least one attempt",
                    name
                )));
            }
            if policy.interval.is_zero() {
                return Err(Error::Config(format!(
                    "{} interval must be greater than zero",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Native-side bridge configuration.
///
/// Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Page loaded into the embedded browser surface (http or https)
    pub auth_page_url: Url,

    /// Settings handed to the page-side flow
    pub flow: FlowSettings,

    /// Capacity of the authentication event bus
    pub event_buffer: usize,

    /// Secure credential storage (required)
    pub secure_store: Arc<dyn SecureStore>,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("auth_page_url", &self.auth_page_url.as_str())
            .field("flow", &self.flow)
            .field("event_buffer", &self.event_buffer)
            .field("secure_store", &"SecureStore { ... }")
            .finish()
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Page-side settings derived from this config.
    pub fn flow_settings(&self) -> FlowSettings {
        self.flow.clone()
    }

    pub fn validate(&self) -> Result<()> {
        match self.auth_page_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::Config(format!(
                    "Auth page URL must use http or https, got '{}'",
                    other
                )))
            }
        }

        if self.event_buffer == 0 {
            return Err(Error::Config(
                "Event buffer must hold at least one event".to_string(),
            ));
        }

        self.flow.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn secure_store_missing_error() -> Error {
    Error::capability_missing(
        "SecureStore",
        "SecureStore implementation is required for credential persistence. \
         Desktop: ensure the 'desktop-shims' feature is enabled to use the default KeyringSecureStore. \
         Mobile: inject platform-native secure storage (Keychain / EncryptedSharedPreferences).",
    )
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::KeyringSecureStore;

    let store: Arc<dyn SecureStore> = Arc::new(KeyringSecureStore::new());
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(secure_store_missing_error())
}

/// Builder for [`BridgeConfig`].
#[derive(Default)]
pub struct BridgeConfigBuilder {
    auth_page_url: Option<String>,
    project_id: Option<String>,
    show_branding_panel: Option<bool>,
    capability_poll: Option<RetryPolicy>,
    private_key_poll: Option<RetryPolicy>,
    token_poll: Option<RetryPolicy>,
    settle_delay: Option<Duration>,
    event_buffer: Option<usize>,
    secure_store: Option<Arc<dyn SecureStore>>,
}

impl BridgeConfigBuilder {
    /// Seeds the builder from `PASSKEY_BRIDGE_AUTH_URL` and
    /// `PASSKEY_BRIDGE_PROJECT_ID`. Unset or empty variables are skipped;
    /// later builder calls override them.
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = non_empty(ENV_AUTH_URL) {
            self.auth_page_url = Some(url);
        }
        if let Some(project_id) = non_empty(ENV_PROJECT_ID) {
            self.project_id = Some(project_id);
        }
        self
    }

    pub fn auth_page_url(mut self, url: impl Into<String>) -> Self {
        self.auth_page_url = Some(url.into());
        self
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Defaults to `true`.
    pub fn show_branding_panel(mut self, show: bool) -> Self {
        self.show_branding_panel = Some(show);
        self
    }

    pub fn capability_poll(mut self, policy: RetryPolicy) -> Self {
        self.capability_poll = Some(policy);
        self
    }

    pub fn private_key_poll(mut self, policy: RetryPolicy) -> Self {
        self.private_key_poll = Some(policy);
        self
    }

    pub fn token_poll(mut self, policy: RetryPolicy) -> Self {
        self.token_poll = Some(policy);
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = Some(capacity);
        self
    }

    /// Sets the secure store implementation (required unless `desktop-shims`).
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn build(self) -> Result<BridgeConfig> {
        let raw_url = self.auth_page_url.ok_or_else(|| {
            Error::Config(format!(
                "Auth page URL is required. Use .auth_page_url() or set {}.",
                ENV_AUTH_URL
            ))
        })?;
        let auth_page_url = Url::parse(&raw_url)
            .map_err(|e| Error::Config(format!("Invalid auth page URL '{}': {}", raw_url, e)))?;

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };

        let defaults = FlowSettings::default();
        let flow = FlowSettings {
            project_id: self.project_id,
            show_branding_panel: self
                .show_branding_panel
                .unwrap_or(defaults.show_branding_panel),
            capability_poll: self.capability_poll.unwrap_or(defaults.capability_poll),
            private_key_poll: self.private_key_poll.unwrap_or(defaults.private_key_poll),
            token_poll: self.token_poll.unwrap_or(defaults.token_poll),
            settle_delay: self.settle_delay.unwrap_or(defaults.settle_delay),
        };

        let config = BridgeConfig {
            auth_page_url,
            flow,
            event_buffer: self.event_buffer.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            secure_store,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::MemorySecureStore;
    use std::collections::HashMap;

    fn memory_store() -> Arc<dyn SecureStore> {
        Arc::new(MemorySecureStore::new())
    }

    #[test]
    fn test_build_with_defaults() {
        let config = BridgeConfig::builder()
            .auth_page_url("https://auth.example.com/mobile")
            .secure_store(memory_store())
            .build()
            .unwrap();

        assert_eq!(config.auth_page_url.host_str(), Some("auth.example.com"));
        assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.flow, FlowSettings::default());
        assert_eq!(config.flow.capability_poll.max_attempts, 30);
        assert_eq!(config.flow.private_key_poll.max_attempts, 25);
        assert_eq!(config.flow.token_poll.interval, Duration::from_millis(200));
        assert!(config.flow.show_branding_panel);
    }

    #[test]
    fn test_build_with_overrides() {
        let config = BridgeConfig::builder()
            .auth_page_url("http://localhost:3000/auth")
            .project_id("proj_1")
            .show_branding_panel(false)
            .capability_poll(RetryPolicy::from_millis(100, 10))
            .settle_delay(Duration::ZERO)
            .event_buffer(8)
            .secure_store(memory_store())
            .build()
            .unwrap();

        let flow = config.flow_settings();
        assert_eq!(flow.project_id.as_deref(), Some("proj_1"));
        assert!(!flow.show_branding_panel);
        assert_eq!(flow.capability_poll, RetryPolicy::from_millis(100, 10));
        assert_eq!(flow.settle_delay, Duration::ZERO);
        assert_eq!(config.event_buffer, 8);
    }

    #[test]
    fn test_missing_url_fails() {
        let result = BridgeConfig::builder().secure_store(memory_store()).build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Auth page URL")));
    }

    #[test]
    fn test_unparseable_url_fails() {
        let result = BridgeConfig::builder()
            .auth_page_url("not a url")
            .secure_store(memory_store())
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_non_http_scheme_fails() {
        let result = BridgeConfig::builder()
            .auth_page_url("file:///tmp/auth.html")
            .secure_store(memory_store())
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("http or https")));
    }

    #[test]
    fn test_zero_attempt_policy_fails() {
        let result = BridgeConfig::builder()
            .auth_page_url("https://auth.example.com")
            .token_poll(RetryPolicy::from_millis(200, 0))
            .secure_store(memory_store())
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("token_poll")));
    }

    #[test]
    fn test_blank_project_id_fails() {
        let settings = FlowSettings::default().with_project_id("  ");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_event_buffer_fails() {
        let result = BridgeConfig::builder()
            .auth_page_url("https://auth.example.com")
            .event_buffer(0)
            .secure_store(memory_store())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let vars: HashMap<&str, &str> = [
            (ENV_AUTH_URL, "https://auth.example.com/from-env"),
            (ENV_PROJECT_ID, "proj_env"),
        ]
        .into_iter()
        .collect();

        let config = BridgeConfig::builder()
            .from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .secure_store(memory_store())
            .build()
            .unwrap();

        assert_eq!(config.auth_page_url.path(), "/from-env");
        assert_eq!(config.flow.project_id.as_deref(), Some("proj_env"));
    }

    #[test]
    fn test_from_lookup_skips_empty_values() {
        let builder = BridgeConfig::builder()
            .auth_page_url("https://auth.example.com")
            .from_lookup(|key| (key == ENV_AUTH_URL).then(String::new));

        let config = builder.secure_store(memory_store()).build().unwrap();
        assert_eq!(config.auth_page_url.host_str(), Some("auth.example.com"));
    }

    #[test]
    fn test_debug_hides_store() {
        let config = BridgeConfig::builder()
            .auth_page_url("https://auth.example.com")
            .secure_store(memory_store())
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("SecureStore { ... }"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_secure_store_is_capability_error() {
        let result = BridgeConfig::builder()
            .auth_page_url("https://auth.example.com")
            .build();
        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { capability, .. }) if capability == "SecureStore"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_shims_inject_keyring_store() {
        let result = BridgeConfig::builder()
            .auth_page_url("https://auth.example.com")
            .build();
        assert!(result.is_ok());
    }
}
