//! Embedded browser surface primitives.
//!
//! These are the two things the page context needs from its host besides the
//! capability itself: a way to post a message to native code, and a way to
//! know when the document has finished parsing.

use crate::{error::Result, platform::PlatformSendSync};

/// One-way message delivery from the page to the native host.
///
/// Backed by `window.webkit.messageHandlers.nativeBridge.postMessage` on iOS
/// and `window.AndroidBridge.postMessage` on Android.
///
/// Delivery is at-most-once with no acknowledgement. An `Err` means the host
/// primitive is missing or rejected the call, not that native code failed to
/// process the message.
pub trait NativeMessagePort: PlatformSendSync {
    fn post_message(&self, message: &str) -> Result<()>;
}

/// `document.readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentReadyState {
    Loading,
    Interactive,
    Complete,
}

impl DocumentReadyState {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "loading" => Some(Self::Loading),
            "interactive" => Some(Self::Interactive),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// `true` once DOMContentLoaded has already fired.
    pub fn is_dom_ready(self) -> bool {
        matches!(self, Self::Interactive | Self::Complete)
    }
}

/// DOM readiness as observed by page-side code.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait DocumentLifecycle: PlatformSendSync {
    fn ready_state(&self) -> DocumentReadyState;

    /// Resolves when DOMContentLoaded fires. Only awaited while
    /// [`ready_state`](Self::ready_state) is `Loading`.
    async fn dom_content_loaded(&self);
}
