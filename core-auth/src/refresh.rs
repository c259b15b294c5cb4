//! Silent token refresh.
//!
//! Runs on a headless page load with an already provisioned device key. No
//! login modal is shown: the capability is asked for a fresh access token
//! once, and the result is posted as `REFRESH_SUCCESS` or `REFRESH_FAILED`.

use std::sync::Arc;

use bridge_traits::{CapabilityBinding, NativeMessagePort};
use tracing::{info, instrument, warn};

use crate::envelope::{
    BridgeEnvelope, EnvelopeSender, RefreshFailedPayload, RefreshFailureReason,
};
use crate::error::non_empty_or_unknown;
use crate::poller::classify;

pub struct SilentRefresh {
    binding: Arc<dyn CapabilityBinding>,
    sender: EnvelopeSender,
}

impl SilentRefresh {
    pub fn new(binding: Arc<dyn CapabilityBinding>, port: Arc<dyn NativeMessagePort>) -> Self {
        Self {
            binding,
            sender: EnvelopeSender::new(port),
        }
    }

    /// Attempts one refresh and posts the result.
    ///
    /// Returns the new token, or the failure payload that was posted.
    #[instrument(skip_all, name = "silent_refresh")]
    pub async fn run(self) -> Result<String, RefreshFailedPayload> {
        let result = self.refresh().await;

        let envelope = match &result {
            Ok(token) => {
                info!(token_len = token.len(), "Token refreshed");
                BridgeEnvelope::refresh_success(token.clone())
            }
            Err(failure) => {
                warn!(reason = %failure.reason, message = ?failure.message, "Token refresh failed");
                BridgeEnvelope::refresh_failed(failure.clone())
            }
        };

        // Fire-and-forget, as for the interactive flow.
        let _ = self.sender.send(&envelope);
        result
    }

    async fn refresh(&self) -> Result<String, RefreshFailedPayload> {
        let capability = self
            .binding
            .resolve()
            .filter(|capability| classify(capability.as_ref()).is_ready())
            .ok_or_else(|| RefreshFailedPayload::new(RefreshFailureReason::SdkNotLoaded))?;

        let has_key = capability.has_private_key().await.map_err(|e| {
            RefreshFailedPayload::new(RefreshFailureReason::Error)
                .with_message(non_empty_or_unknown(e.to_string()))
        })?;
        if !has_key {
            return Err(RefreshFailedPayload::new(RefreshFailureReason::NoPrivateKey));
        }

        match capability.get_access_token().await {
            Ok(Some(token)) if !token.is_empty() => Ok(token),
            Ok(_) => Err(RefreshFailedPayload::new(
                RefreshFailureReason::TokenGenerationFailed,
            )),
            Err(e) => Err(RefreshFailedPayload::new(RefreshFailureReason::Error)
                .with_message(non_empty_or_unknown(e.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::ChannelMessagePort;
    use bridge_traits::{
        error::Result as BridgeResult, AuthCapability, BridgeError, LoginModalOptions,
        LoginModalResult,
    };

    struct Device {
        has_key: BridgeResult<bool>,
        token: BridgeResult<Option<String>>,
    }

    #[async_trait]
    impl AuthCapability for Device {
        async fn open_auth_login_modal(
            &self,
            _options: &LoginModalOptions,
        ) -> BridgeResult<LoginModalResult> {
            Ok(LoginModalResult::default())
        }

        async fn has_private_key(&self) -> BridgeResult<bool> {
            self.has_key.clone()
        }

        async fn get_access_token(&self) -> BridgeResult<Option<String>> {
            self.token.clone()
        }
    }

    struct Binding(Option<Arc<dyn AuthCapability>>);

    impl CapabilityBinding for Binding {
        fn resolve(&self) -> Option<Arc<dyn AuthCapability>> {
            self.0.clone()
        }
    }

    async fn run_with(
        device: Option<Device>,
    ) -> (Result<String, RefreshFailedPayload>, BridgeEnvelope) {
        let (port, mut rx) = ChannelMessagePort::new();
        let binding = Binding(device.map(|d| Arc::new(d) as Arc<dyn AuthCapability>));

        let result = SilentRefresh::new(Arc::new(binding), Arc::new(port)).run().await;
        let posted = BridgeEnvelope::decode(&rx.recv().await.unwrap()).unwrap();
        (result, posted)
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let (result, posted) = run_with(Some(Device {
            has_key: Ok(true),
            token: Ok(Some("fresh".to_string())),
        }))
        .await;

        assert_eq!(result, Ok("fresh".to_string()));
        assert_eq!(posted, BridgeEnvelope::refresh_success("fresh"));
    }

    #[tokio::test]
    async fn test_sdk_not_loaded() {
        let (result, posted) = run_with(None).await;

        let expected = RefreshFailedPayload::new(RefreshFailureReason::SdkNotLoaded);
        assert_eq!(result, Err(expected.clone()));
        assert_eq!(posted, BridgeEnvelope::refresh_failed(expected));
    }

    #[tokio::test]
    async fn test_no_private_key() {
        let (result, _) = run_with(Some(Device {
            has_key: Ok(false),
            token: Ok(Some("never".to_string())),
        }))
        .await;

        assert_eq!(
            result.unwrap_err().reason,
            RefreshFailureReason::NoPrivateKey
        );
    }

    #[tokio::test]
    async fn test_empty_token_is_generation_failure() {
        let (result, _) = run_with(Some(Device {
            has_key: Ok(true),
            token: Ok(Some(String::new())),
        }))
        .await;

        assert_eq!(
            result.unwrap_err().reason,
            RefreshFailureReason::TokenGenerationFailed
        );
    }

    #[tokio::test]
    async fn test_rejection_carries_message() {
        let (result, posted) = run_with(Some(Device {
            has_key: Ok(true),
            token: Err(BridgeError::Rejected("key locked".to_string())),
        }))
        .await;

        let expected =
            RefreshFailedPayload::new(RefreshFailureReason::Error).with_message("key locked");
        assert_eq!(result, Err(expected.clone()));
        assert_eq!(posted, BridgeEnvelope::refresh_failed(expected));
    }
}
