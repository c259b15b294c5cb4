//! Vendor capability bound to a page global.
//!
//! The vendor script installs its object on `window` (by default
//! `window.transcodes`). [`GlobalCapabilityBinding`] looks the object up on
//! every poll tick and wraps it in a [`JsAuthCapability`], which calls the
//! promise-returning entry points through `js_sys::Reflect`.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::{
    error::Result as BridgeResult, AuthCapability, CapabilityBinding, LoginModalOptions,
    LoginModalResult,
};
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use tracing::trace;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::{WasmError, WasmResult};

/// Name of the vendor global when none is configured.
pub const DEFAULT_CAPABILITY_GLOBAL: &str = "transcodes";

const LOGIN_ENTRY_POINT: &str = "openAuthLoginModal";
const READY_FLAG: &str = "ready";

/// Resolves the vendor object from `window[global]`.
#[derive(Debug, Clone)]
pub struct GlobalCapabilityBinding {
    global: String,
}

impl GlobalCapabilityBinding {
    /// Binding for a global with a custom name.
    pub fn new(global: impl Into<String>) -> Self {
        Self {
            global: global.into(),
        }
    }
}

impl Default for GlobalCapabilityBinding {
    fn default() -> Self {
        Self::new(DEFAULT_CAPABILITY_GLOBAL)
    }
}

impl CapabilityBinding for GlobalCapabilityBinding {
    fn resolve(&self) -> Option<Arc<dyn AuthCapability>> {
        let window = web_sys::window()?;
        let object = Reflect::get(&window, &JsValue::from_str(&self.global)).ok()?;
        if object.is_undefined() || object.is_null() {
            trace!(global = %self.global, "Capability global not defined yet");
            return None;
        }
        Some(Arc::new(JsAuthCapability { object }))
    }
}

/// Async surface of the vendor object.
pub struct JsAuthCapability {
    object: JsValue,
}

impl JsAuthCapability {
    /// Wraps an already resolved vendor object.
    pub fn from_object(object: JsValue) -> Self {
        Self { object }
    }

    fn entry_point(&self) -> Option<Function> {
        Reflect::get(&self.object, &JsValue::from_str(LOGIN_ENTRY_POINT))
            .ok()?
            .dyn_into::<Function>()
            .ok()
    }

    fn token_api(&self) -> WasmResult<JsValue> {
        let token = Reflect::get(&self.object, &JsValue::from_str("token"))?;
        if token.is_undefined() || token.is_null() {
            return Err(WasmError::NotAvailable("token API".to_string()));
        }
        Ok(token)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AuthCapability for JsAuthCapability {
    async fn open_auth_login_modal(
        &self,
        options: &LoginModalOptions,
    ) -> BridgeResult<LoginModalResult> {
        let entry_point = self
            .entry_point()
            .ok_or_else(|| WasmError::NotAvailable(LOGIN_ENTRY_POINT.to_string()))?;
        let options = to_js(options)?;
        let value = call_async(&entry_point, &self.object, &[options]).await?;
        Ok(serde_wasm_bindgen::from_value(value).map_err(WasmError::from)?)
    }

    async fn has_private_key(&self) -> BridgeResult<bool> {
        let token = self.token_api()?;
        let value = call_method(&token, "hasPrivateKey").await?;
        Ok(value.is_truthy())
    }

    async fn get_access_token(&self) -> BridgeResult<Option<String>> {
        let token = self.token_api()?;
        let value = call_method(&token, "getAccessToken").await?;
        Ok(value.as_string())
    }

    /// The vendor's boolean `ready` property when published. A global
    /// without a callable entry point is still a stub.
    fn readiness(&self) -> Option<bool> {
        if self.entry_point().is_none() {
            return Some(false);
        }
        Reflect::get(&self.object, &JsValue::from_str(READY_FLAG))
            .ok()
            .and_then(|flag| flag.as_bool())
    }

    fn entry_point_signature(&self) -> Option<String> {
        self.entry_point()
            .map(|function| String::from(function.to_string()))
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> WasmResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(WasmError::from)
}

async fn call_method(target: &JsValue, name: &str) -> WasmResult<JsValue> {
    let function = Reflect::get(target, &JsValue::from_str(name))?
        .dyn_into::<Function>()
        .map_err(|_| WasmError::NotAvailable(name.to_string()))?;
    call_async(&function, target, &[]).await
}

/// Calls `function` and awaits the result. Plain return values are wrapped
/// with `Promise.resolve`, so sync and async vendor methods look the same.
async fn call_async(function: &Function, this: &JsValue, args: &[JsValue]) -> WasmResult<JsValue> {
    let returned = match args {
        [] => function.call0(this)?,
        [first] => function.call1(this, first)?,
        _ => function.apply(this, &args.iter().collect::<js_sys::Array>())?,
    };
    JsFuture::from(Promise::resolve(&returned))
        .await
        .map_err(WasmError::from)
}
