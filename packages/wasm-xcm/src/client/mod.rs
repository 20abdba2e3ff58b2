//! Chain access boundary
//!
//! The workflow never talks to a node directly; it goes through
//! [`ChainClient`]. A wallet-backed implementation lives with the integrator,
//! `MockChainClient` (feature `mock`) simulates the deployed contracts in
//! memory.

pub mod contract;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use thiserror::Error;

use crate::types::Weight;
use crate::xcm::XcmProgram;

pub use contract::{extract_minted_token_id, weigh_message_calldata, ContractCall};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockChainClient, MockMethod, SubmitGate};

/// Failure reported by a [`ChainClient`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Node unreachable or request dropped; safe to retry
    #[error("Chain unavailable: {0}")]
    ChainUnavailable(String),
    /// Transaction or call reverted on chain
    #[error("Transaction reverted: {reason}")]
    TxReverted { reason: String },
    /// Submitted but not confirmed in time; may still be included
    #[error("Transaction not confirmed after {waited:?}")]
    TxTimeout { waited: Duration },
}

impl ChainError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::ChainUnavailable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Confirmation of an included transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub logs: Vec<LogEntry>,
}

/// Calls the workflow needs from the chain
///
/// `submit` resolves only once the transaction is included.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Deployed bytecode at `address`; empty when nothing is deployed
    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError>;

    /// `registryFee()` on the copyright registry
    async fn registry_fee(&self, registry: Address) -> Result<U256, ChainError>;

    /// `balanceOf(owner)` on `token`
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    /// `getApproved(tokenId)` on the registry
    async fn get_approved(&self, registry: Address, token_id: U256)
        -> Result<Address, ChainError>;

    /// `weighMessage` on the XCM precompile
    async fn estimate_weight(&self, program: &XcmProgram) -> Result<Weight, ChainError>;

    /// Sign `call` as `from`, submit it and wait for inclusion
    async fn submit(&self, from: Address, call: &ContractCall) -> Result<TxReceipt, ChainError>;
}
