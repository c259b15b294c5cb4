//! Page → native message port backed by the webview's script handlers.

use bridge_traits::{error::Result as BridgeResult, NativeMessagePort};
use js_sys::{Function, Reflect};
use tracing::trace;
use wasm_bindgen::{JsCast, JsValue};

use crate::error::{WasmError, WasmResult};

/// Posts to `window.webkit.messageHandlers.<handler>` when running in
/// WKWebView, otherwise to `window.AndroidBridge`.
#[derive(Debug, Clone)]
pub struct WebViewMessagePort {
    handler: String,
}

impl WebViewMessagePort {
    /// Port for the given WKWebView handler name.
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
        }
    }

    /// Whether either host primitive is present.
    pub fn is_available(&self) -> bool {
        self.target().is_ok()
    }

    fn target(&self) -> WasmResult<JsValue> {
        let window = web_sys::window()
            .ok_or_else(|| WasmError::NotAvailable("window".to_string()))?;

        let webkit = lookup(&window, &["webkit", "messageHandlers", &self.handler]);
        if let Some(handler) = webkit {
            return Ok(handler);
        }
        lookup(&window, &["AndroidBridge"]).ok_or_else(|| {
            WasmError::NotAvailable(format!(
                "webkit.messageHandlers.{} or AndroidBridge",
                self.handler
            ))
        })
    }
}

impl Default for WebViewMessagePort {
    fn default() -> Self {
        Self::new(core_auth::console::BRIDGE_HANDLER_NAME)
    }
}

impl NativeMessagePort for WebViewMessagePort {
    fn post_message(&self, message: &str) -> BridgeResult<()> {
        let target = self.target()?;
        let post = Reflect::get(&target, &JsValue::from_str("postMessage"))
            .map_err(WasmError::from)?
            .dyn_into::<Function>()
            .map_err(|_| WasmError::NotAvailable("postMessage".to_string()))?;

        trace!(len = message.len(), "Posting message to native host");
        post.call1(&target, &JsValue::from_str(message))
            .map_err(WasmError::from)?;
        Ok(())
    }
}

fn lookup(root: &JsValue, path: &[&str]) -> Option<JsValue> {
    path.iter().try_fold(root.clone(), |current, key| {
        let next = Reflect::get(&current, &JsValue::from_str(key)).ok()?;
        (!next.is_undefined() && !next.is_null()).then_some(next)
    })
}
