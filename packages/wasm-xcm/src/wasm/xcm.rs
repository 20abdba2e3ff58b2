//! WASM bindings for teleport XCM
//!
//! XcmNamespace builds the program the XCM precompile weighs and parses
//! programs back into a summary.

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::address::AddressCodec;
use crate::error::WasmXcmError;
use crate::types::{deserialize_u128, AddressFormat, TeleportRequest};
use crate::xcm::parser::summarize_teleport;
use crate::xcm::{build_teleport, parse_program_hex, parse_teleport, FeeSchedule, ParsedTeleport};

/// Teleport parameters as passed from JS
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeleportParams {
    destination_para_id: u32,
    /// SS58 address
    beneficiary: String,
    /// Amount in planck (string or number)
    #[serde(deserialize_with = "deserialize_u128")]
    amount: u128,
    #[serde(default)]
    fees: Option<FeeSchedule>,
}

#[wasm_bindgen]
pub struct XcmNamespace;

#[wasm_bindgen]
impl XcmNamespace {
    /// Build a teleport program
    ///
    /// # Example Params
    /// ```json
    /// {
    ///   "destinationParaId": 1000,
    ///   "beneficiary": "13mEPECpownFgBYbssfq23V8xjm2oarxieMVoKAKME4L8JXn",
    ///   "amount": "1000000000000",
    ///   "fees": { "localFee": "1000000000", "remoteFee": "1000000000" }
    /// }
    /// ```
    ///
    /// # Returns
    /// SCALE encoded `VersionedXcm` as 0x-prefixed hex
    #[wasm_bindgen(js_name = buildTeleport)]
    pub fn build_teleport_wasm(params: JsValue) -> Result<String, JsValue> {
        let params: TeleportParams = serde_wasm_bindgen::from_value(params)
            .map_err(|e| JsValue::from_str(&format!("Invalid params: {}", e)))?;

        let beneficiary = AddressCodec::default().decode(&params.beneficiary)?;
        let request =
            TeleportRequest::new(params.destination_para_id, beneficiary, params.amount);
        let program = build_teleport(&request, &params.fees.unwrap_or_default())?;
        Ok(program.to_hex())
    }

    /// Parse and verify a teleport program
    ///
    /// # Arguments
    /// * `bytes` - SCALE encoded `VersionedXcm`
    /// * `prefix` - SS58 prefix for the beneficiary (default: Polkadot)
    #[wasm_bindgen(js_name = parseTeleport)]
    pub fn parse_teleport_wasm(bytes: &[u8], prefix: Option<u16>) -> Result<JsValue, JsValue> {
        let parsed = parse_teleport(bytes, format_for(prefix)?)?;
        to_js_value(&parsed)
    }

    /// Parse a teleport program from hex (with or without 0x prefix)
    #[wasm_bindgen(js_name = parseTeleportHex)]
    pub fn parse_teleport_hex(hex: &str, prefix: Option<u16>) -> Result<JsValue, JsValue> {
        let program = parse_program_hex(hex)?;
        let parsed = summarize_teleport(&program, format_for(prefix)?)?;
        to_js_value(&parsed)
    }
}

fn format_for(prefix: Option<u16>) -> Result<AddressFormat, WasmXcmError> {
    match prefix {
        None => Ok(AddressFormat::Polkadot),
        Some(prefix) => {
            AddressFormat::from_prefix(prefix).ok_or(WasmXcmError::UnsupportedAddressVersion(prefix))
        }
    }
}

fn to_js_value(parsed: &ParsedTeleport) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(parsed)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    const GOLDEN_TELEPORT: &str = "0x050c00040100000700e40b54023001000002286bee31010100a10f0100000401000002286bee000400010204040d01020400010100acbf9f8faa01b5393e504ff45b22bdec9526807502ec994ad5e24a48f39b6b53";

    #[wasm_bindgen_test]
    fn test_build_teleport_golden() {
        let params = serde_wasm_bindgen::to_value(&serde_json::json!({
            "destinationParaId": 1000,
            "beneficiary": "5FyD1xa3jfLFg65TpRK7fQiUMcajGJvY6M715jNDABtPsQt7",
            "amount": "8000000000",
        }))
        .unwrap();
        assert_eq!(
            XcmNamespace::build_teleport_wasm(params).unwrap(),
            GOLDEN_TELEPORT
        );
    }

    #[wasm_bindgen_test]
    fn test_parse_teleport_hex() {
        let parsed = XcmNamespace::parse_teleport_hex(GOLDEN_TELEPORT, Some(42)).unwrap();
        let para = js_sys::Reflect::get(&parsed, &"destinationParaId".into()).unwrap();
        assert_eq!(para.as_f64(), Some(1000.0));
        let withdrawn = js_sys::Reflect::get(&parsed, &"withdrawAmount".into()).unwrap();
        assert_eq!(withdrawn.as_string().as_deref(), Some("10000000000"));
    }
}
