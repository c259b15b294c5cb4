//! Document lifecycle for hosts without a DOM.

use async_trait::async_trait;
use bridge_traits::webview::{DocumentLifecycle, DocumentReadyState};
use tokio::sync::watch;

/// `DocumentLifecycle` driven by the host instead of a browser.
///
/// Starts in whatever state it is constructed with. [`mark_loaded`] flips it
/// to `Complete` and wakes every pending `dom_content_loaded` waiter.
///
/// [`mark_loaded`]: StaticDocumentLifecycle::mark_loaded
pub struct StaticDocumentLifecycle {
    state: watch::Sender<DocumentReadyState>,
}

impl StaticDocumentLifecycle {
    pub fn new(initial: DocumentReadyState) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state }
    }

    /// A document that finished loading before the bridge started.
    pub fn loaded() -> Self {
        Self::new(DocumentReadyState::Complete)
    }

    /// A document still parsing; call [`mark_loaded`](Self::mark_loaded) later.
    pub fn loading() -> Self {
        Self::new(DocumentReadyState::Loading)
    }

    pub fn mark_loaded(&self) {
        self.state.send_replace(DocumentReadyState::Complete);
    }
}

impl Default for StaticDocumentLifecycle {
    fn default() -> Self {
        Self::loaded()
    }
}

#[async_trait]
impl DocumentLifecycle for StaticDocumentLifecycle {
    fn ready_state(&self) -> DocumentReadyState {
        *self.state.borrow()
    }

    async fn dom_content_loaded(&self) {
        let mut rx = self.state.subscribe();
        // Sender lives in self, so wait_for only fails if self is gone
        let _ = rx.wait_for(|state| state.is_dom_ready()).await;
    }
}
