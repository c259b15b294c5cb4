//! JavaScript entry points for the sign-in page.
//!
//! ```javascript
//! import init, { initBridge, startAuthFlow, startSilentRefresh } from './bridge_wasm.js';
//!
//! await init();
//! initBridge({ logLevel: 'debug' });
//!
//! // /auth/mobile
//! const outcome = await startAuthFlow({ projectId: 'proj_123' });
//!
//! // /auth/refresh
//! await startSilentRefresh();
//! ```
//!
//! Both flows post their envelopes to the native host themselves; the
//! returned values are only for the page's own status display.

use std::sync::Arc;

use bridge_traits::LogLevel;
use core_auth::{AuthFlowController, SilentRefresh};
use core_runtime::config::FlowSettings;
use core_runtime::logging::{init_logging, LoggingConfig};
use serde::Deserialize;
use tracing::info;
use wasm_bindgen::prelude::*;

use crate::capability::{GlobalCapabilityBinding, DEFAULT_CAPABILITY_GLOBAL};
use crate::lifecycle::DomLifecycle;
use crate::message_port::WebViewMessagePort;

fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Options accepted by [`start_auth_flow`] and [`start_silent_refresh`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PageOptions {
    project_id: Option<String>,
    show_branding_panel: Option<bool>,
    capability_global: Option<String>,
    handler_name: Option<String>,
}

impl PageOptions {
    fn from_js(value: JsValue) -> Result<Self, JsValue> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(to_js_error)
    }

    fn settings(&self) -> FlowSettings {
        let mut settings = FlowSettings::default();
        if let Some(project_id) = &self.project_id {
            settings = settings.with_project_id(project_id.clone());
        }
        if let Some(show) = self.show_branding_panel {
            settings = settings.with_branding_panel(show);
        }
        settings
    }

    fn binding(&self) -> GlobalCapabilityBinding {
        GlobalCapabilityBinding::new(
            self.capability_global
                .as_deref()
                .unwrap_or(DEFAULT_CAPABILITY_GLOBAL),
        )
    }

    fn port(&self) -> WebViewMessagePort {
        self.handler_name
            .as_deref()
            .map(WebViewMessagePort::new)
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct InitOptions {
    log_level: Option<String>,
    log_filter: Option<String>,
}

/// Installs the panic hook and browser console logging.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
#[wasm_bindgen(js_name = initBridge)]
pub fn init_bridge(options: JsValue) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let options: InitOptions = if options.is_undefined() || options.is_null() {
        InitOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options).map_err(to_js_error)?
    };

    let mut config = LoggingConfig::default();
    if let Some(level) = options.log_level.as_deref() {
        config = config.with_level(LogLevel::from_console_method(level));
    }
    if let Some(filter) = options.log_filter {
        config = config.with_filter(filter);
    }
    if init_logging(config).is_ok() {
        info!("Page bridge initialised");
    }
    Ok(())
}

/// Runs one interactive sign-in. Resolves to `"Success"`, `"Cancelled"` or
/// `"Error"`.
#[wasm_bindgen(js_name = startAuthFlow)]
pub async fn start_auth_flow(options: JsValue) -> Result<String, JsValue> {
    let options = PageOptions::from_js(options)?;
    let settings = options.settings();
    settings.validate().map_err(to_js_error)?;

    let controller = AuthFlowController::new(
        Arc::new(options.binding()),
        Arc::new(DomLifecycle::new()),
        Arc::new(options.port()),
        settings,
    );
    Ok(controller.run().await.kind().to_string())
}

/// Runs one silent refresh. Rejects with the failure reason, e.g.
/// `"NO_PRIVATE_KEY"`.
#[wasm_bindgen(js_name = startSilentRefresh)]
pub async fn start_silent_refresh(options: JsValue) -> Result<(), JsValue> {
    let options = PageOptions::from_js(options)?;
    SilentRefresh::new(Arc::new(options.binding()), Arc::new(options.port()))
        .run()
        .await
        .map(|_| ())
        .map_err(|failure| JsValue::from_str(failure.reason.as_str()))
}

/// Whether a native host message handler is reachable from this page.
#[wasm_bindgen(js_name = hasNativeHost)]
pub fn has_native_host() -> bool {
    WebViewMessagePort::default().is_available()
}
