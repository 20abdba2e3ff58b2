//! WASM bindings for wasm-xcm
//!
//! Thin wrappers with #[wasm_bindgen] that delegate to the core address and
//! XCM modules. The orchestrator is consumed from Rust only.

pub mod address;
pub mod try_into_js_value;
pub mod xcm;

pub use address::AddressNamespace;
pub use xcm::XcmNamespace;
