//! Error types for wasm-xcm

use thiserror::Error;
use wasm_bindgen::prelude::*;

/// Main error type for wasm-xcm operations
///
/// Everything here is raised synchronously, before any chain call is made.
/// Failures that happen while a workflow is talking to the chain are reported
/// as [`crate::workflow::FailureCause`] on the terminal state instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WasmXcmError {
    /// Bad base58 alphabet, length or checksum
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),
    /// Well-formed address for a network prefix we do not accept
    #[error("Unsupported address version: prefix {0}")]
    UnsupportedAddressVersion(u16),
    /// Teleport amount does not cover the reserved fee buffer
    #[error("Amount {amount} does not exceed fee reserve {reserve}")]
    AmountBelowFeeReserve { amount: u128, reserve: u128 },
    /// Destination parachain is not in the allowed set
    #[error("Unknown destination parachain: {0}")]
    UnknownDestination(u32),
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// SCALE codec decode error
    #[error("SCALE decode error: {0}")]
    ScaleDecodeError(String),
    /// Decoded XCM does not have the teleport shape
    #[error("Invalid XCM program: {0}")]
    InvalidProgram(String),
    /// Another workflow already holds this asset or account
    #[error("Workflow already in progress for {0}")]
    WorkflowAlreadyInProgress(String),
    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Config(String),
}

impl From<parity_scale_codec::Error> for WasmXcmError {
    fn from(err: parity_scale_codec::Error) -> Self {
        WasmXcmError::ScaleDecodeError(err.to_string())
    }
}

impl From<serde_json::Error> for WasmXcmError {
    fn from(err: serde_json::Error) -> Self {
        WasmXcmError::Config(err.to_string())
    }
}

// REQUIRED: Converts to JS Error with stack trace
impl From<WasmXcmError> for JsValue {
    fn from(err: WasmXcmError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WasmXcmError::InvalidAddressFormat("bad checksum".to_string());
        assert_eq!(err.to_string(), "Invalid address format: bad checksum");

        let err = WasmXcmError::AmountBelowFeeReserve {
            amount: 5,
            reserve: 10,
        };
        assert_eq!(err.to_string(), "Amount 5 does not exceed fee reserve 10");
    }

    #[test]
    fn test_from_scale_error() {
        let err: WasmXcmError = parity_scale_codec::Error::from("truncated").into();
        assert!(matches!(err, WasmXcmError::ScaleDecodeError(_)));
    }
}
