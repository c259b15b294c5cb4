//! Error types for the page-side bindings

use bridge_traits::error::BridgeError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for page-side binding operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors raised while talking to the browser or the vendor global
#[derive(Error, Debug)]
pub enum WasmError {
    /// A call threw or a promise rejected; carries the JavaScript message
    #[error("{0}")]
    JavaScript(String),

    /// A global or host primitive is missing
    #[error("Not available: {0}")]
    NotAvailable(String),

    /// A value could not be converted between Rust and JavaScript
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<WasmError> for BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::JavaScript(message) => BridgeError::Rejected(message),
            WasmError::NotAvailable(what) => BridgeError::NotAvailable(what),
            WasmError::Serialization(message) => BridgeError::OperationFailed(message),
        }
    }
}

impl From<JsValue> for WasmError {
    fn from(js_value: JsValue) -> Self {
        WasmError::JavaScript(js_message(&js_value))
    }
}

impl From<serde_wasm_bindgen::Error> for WasmError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        WasmError::Serialization(err.to_string())
    }
}

/// Best-effort message of a thrown value.
///
/// `Error` instances give their `message`, strings are used as is, anything
/// else falls back to its debug form.
pub fn js_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        message
    } else if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        error.message().into()
    } else {
        format!("{:?}", value)
    }
}
