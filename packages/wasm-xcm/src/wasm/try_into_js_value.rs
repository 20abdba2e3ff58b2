//! Rust to JavaScript value conversion
//!
//! Only what the namespaces return by hand lives here. Amounts inside serde
//! summaries such as `ParsedTeleport` cross as decimal strings.

use wasm_bindgen::prelude::*;

use crate::address::AccountRef;

/// Error type for JS conversion failures
#[derive(Debug, Clone)]
pub struct JsConversionError(String);

impl JsConversionError {
    pub fn new(msg: &str) -> Self {
        JsConversionError(msg.to_string())
    }
}

impl std::fmt::Display for JsConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<JsConversionError> for JsValue {
    fn from(err: JsConversionError) -> Self {
        js_sys::Error::new(&err.0).into()
    }
}

pub trait TryIntoJsValue {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError>;
}

impl TryIntoJsValue for String {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        Ok(JsValue::from_str(self))
    }
}

impl TryIntoJsValue for &str {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        Ok(JsValue::from_str(self))
    }
}

impl TryIntoJsValue for u16 {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        Ok(JsValue::from_f64(*self as f64))
    }
}

impl TryIntoJsValue for AccountRef {
    fn try_to_js_value(&self) -> Result<JsValue, JsConversionError> {
        crate::js_obj!(
            "address" => self.display(),
            "publicKey" => self.to_bytes32_hex(),
            "prefix" => self.format().prefix(),
        )
    }
}

/// Build a JS object from `key => value` pairs
#[macro_export]
macro_rules! js_obj {
    ( $( $key:expr => $value:expr ),* $(,)? ) => {{
        use $crate::wasm::try_into_js_value::{TryIntoJsValue, JsConversionError};
        let obj = js_sys::Object::new();
        $(
            js_sys::Reflect::set(
                &obj,
                &wasm_bindgen::JsValue::from_str($key),
                &TryIntoJsValue::try_to_js_value(&$value)?
            ).map_err(|_| JsConversionError::new(&format!("Failed to set property: {}", $key)))?;
        )*
        Ok::<wasm_bindgen::JsValue, JsConversionError>(obj.into())
    }};
}
