//! DOM readiness from `document.readyState` and `DOMContentLoaded`.

use async_trait::async_trait;
use bridge_traits::{DocumentLifecycle, DocumentReadyState};
use futures::channel::oneshot;
use tracing::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{AddEventListenerOptions, Document};

const DOM_CONTENT_LOADED: &str = "DOMContentLoaded";

/// [`DocumentLifecycle`] over the current `window.document`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomLifecycle;

impl DomLifecycle {
    /// Lifecycle of the current document.
    pub fn new() -> Self {
        Self
    }
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DocumentLifecycle for DomLifecycle {
    fn ready_state(&self) -> DocumentReadyState {
        // Without a document there is nothing left to wait for.
        document()
            .and_then(|document| DocumentReadyState::parse(&document.ready_state()))
            .unwrap_or(DocumentReadyState::Complete)
    }

    async fn dom_content_loaded(&self) {
        let Some(document) = document() else {
            return;
        };
        if DocumentReadyState::parse(&document.ready_state())
            .map_or(true, DocumentReadyState::is_dom_ready)
        {
            return;
        }

        let (tx, rx) = oneshot::channel::<()>();
        let mut tx = Some(tx);
        let listener = Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        });

        let options = AddEventListenerOptions::new();
        options.set_once(true);
        if let Err(err) = document.add_event_listener_with_callback_and_add_event_listener_options(
            DOM_CONTENT_LOADED,
            listener.as_ref().unchecked_ref(),
            &options,
        ) {
            warn!(error = %crate::error::js_message(&err), "Could not listen for DOMContentLoaded");
            return;
        }

        // `listener` must outlive the event, so it is held across the await.
        let _ = rx.await;
        debug!("DOMContentLoaded fired");
        drop(listener);
    }
}
