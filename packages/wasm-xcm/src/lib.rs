//! wasm-xcm: SS58 address bridging and copyright teleport workflows
//!
//! This crate provides:
//! - SS58 address decoding/encoding (raw 32-byte keys for XCM beneficiaries)
//! - XCM v5 teleport program building and parsing
//! - A typed call surface for the copyright registry, wrapper and XCM precompile
//! - Orchestration of register, approve, wrap and teleport as a state machine
//!
//! # Architecture
//!
//! The crate follows a two-layer architecture:
//! - **Core layer** (`src/*.rs`, `src/*/`): Pure Rust logic, no WASM dependencies
//! - **WASM layer** (`src/wasm/*.rs`): Thin wrappers with `#[wasm_bindgen]`
//!
//! Chain access goes through the [`client::ChainClient`] trait; the crate never
//! opens a connection itself.

pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod wasm;
pub mod workflow;
pub mod xcm;

// Re-export main types for convenience
pub use address::{decode_ss58, encode_ss58, validate_address, AccountRef, AddressCodec};
pub use client::{ChainClient, ChainError, ContractCall, TxReceipt};
#[cfg(any(test, feature = "mock"))]
pub use client::MockChainClient;
pub use config::BridgeConfig;
pub use error::WasmXcmError;
pub use types::{AddressFormat, Asset, AssetDraft, TeleportRequest, Weight, WrapRecord};
pub use workflow::{
    CancelHandle, FailureCause, Session, Stage, TeleportIntent, TransferOrchestrator,
    WorkflowOutcome, WorkflowRequest, WorkflowState,
};
pub use xcm::{build_teleport, parse_teleport, FeeSchedule, XcmProgram};
