//! WASM bindings for SS58 addresses
//!
//! AddressNamespace converts between SS58 strings and the raw 32-byte keys the
//! teleport contract call takes as `bytes32`.

use crate::address::{encode_ss58, validate_address, AddressCodec};
use crate::error::WasmXcmError;
use crate::types::AddressFormat;
use crate::wasm::try_into_js_value::TryIntoJsValue;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct AddressNamespace;

#[wasm_bindgen]
impl AddressNamespace {
    /// Decode and checksum-verify an SS58 address
    ///
    /// # Returns
    /// `{ address, publicKey, prefix }` with `publicKey` as 0x-prefixed hex
    #[wasm_bindgen(js_name = decode)]
    pub fn decode(address: &str) -> Result<JsValue, JsValue> {
        let account = AddressCodec::default().decode(address)?;
        Ok(account.try_to_js_value()?)
    }

    /// Encode a 32-byte public key with the given network prefix
    #[wasm_bindgen(js_name = encode)]
    pub fn encode(public_key: &[u8], prefix: u16) -> Result<String, JsValue> {
        Ok(encode_ss58(public_key, prefix)?)
    }

    /// The `bytes32` argument for the teleport call
    #[wasm_bindgen(js_name = toBytes32Hex)]
    pub fn to_bytes32_hex(address: &str) -> Result<String, JsValue> {
        let account = AddressCodec::default().decode(address)?;
        Ok(account.to_bytes32_hex())
    }

    /// Re-encode an address for another network
    #[wasm_bindgen(js_name = reencode)]
    pub fn reencode(address: &str, prefix: u16) -> Result<String, JsValue> {
        let format = AddressFormat::from_prefix(prefix)
            .ok_or(WasmXcmError::UnsupportedAddressVersion(prefix))?;
        let account = AddressCodec::default().decode(address)?;
        Ok(account.reencode(format).display().to_string())
    }

    /// Check an address, optionally requiring a specific prefix
    #[wasm_bindgen(js_name = validate)]
    pub fn validate(address: &str, prefix: Option<u16>) -> bool {
        validate_address(address, prefix)
    }
}
