//! Bridge configuration
//!
//! Consumed, not owned, by the core. Defaults describe the Polkadot Hub
//! testnet deployment.

use std::time::Duration;

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize, Serializer};

use crate::address::AddressCodec;
use crate::error::WasmXcmError;
use crate::types::{deserialize_u128, deserialize_u128_option, serialize_u128, AddressFormat};
use crate::workflow::RetryPolicy;
use crate::xcm::FeeSchedule;

/// Reward minted per wrap: 1000 tokens with 18 decimals
pub const DEFAULT_REWARD_PER_WRAP: u128 = 1_000 * 1_000_000_000_000_000_000;

/// Registration fee: 0.01 native with 18 decimals
pub const DEFAULT_REGISTRY_FEE: u128 = 10_000_000_000_000_000;

/// Asset Hub on Paseo
pub const ASSET_HUB_PARA_ID: u32 = 1000;
/// Coretime chain on Paseo
pub const CORETIME_PARA_ID: u32 = 1005;

/// Deployed contracts the workflow talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    /// ERC-721 copyright registry
    pub copyright_registry: Address,
    /// Wrapper/reward token contract that also exposes `teleport`
    pub wrapper: Address,
    /// ink! library the wrapper uses to encode XCM
    pub xcm_library: Address,
    /// XCM precompile (`weighMessage`, `execute`)
    pub xcm_precompile: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        ContractAddresses {
            copyright_registry: address!("8EE0410f86B68B9650Ff230c534787186526c9D9"),
            wrapper: address!("36C62ECf9d2EAd778ca6778794809e96559aa02c"),
            xcm_library: address!("EF1ec0952D3F96ca6C94e217975F89eFee42a9C2"),
            xcm_precompile: address!("00000000000000000000000000000000000A0000"),
        }
    }
}

/// Configuration for the orchestrator and its helpers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// JSON-RPC endpoint, used by concrete chain clients
    pub rpc_url: String,
    /// EVM chain id the session must be connected to
    pub chain_id: u64,
    pub contracts: ContractAddresses,
    /// Parachains a teleport may target
    pub allowed_para_ids: Vec<u32>,
    /// Canonical SS58 format for displaying accounts
    pub address_format: AddressFormat,
    pub fees: FeeSchedule,
    /// Expected balance increase per wrap (in token base units)
    #[serde(
        deserialize_with = "deserialize_u128",
        serialize_with = "serialize_u128"
    )]
    pub reward_per_wrap: u128,
    /// When set, the live `registryFee()` must match at workflow start
    #[serde(
        deserialize_with = "deserialize_u128_option",
        serialize_with = "serialize_u128_option"
    )]
    pub expected_registry_fee: Option<u128>,
    /// Upper bound on any single chain call, including inclusion wait
    pub call_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            rpc_url: "https://rpc.polkadothub-testnet.polkadot.io".to_string(),
            chain_id: 420_420_422,
            contracts: ContractAddresses::default(),
            allowed_para_ids: vec![ASSET_HUB_PARA_ID, CORETIME_PARA_ID],
            address_format: AddressFormat::Polkadot,
            fees: FeeSchedule::default(),
            reward_per_wrap: DEFAULT_REWARD_PER_WRAP,
            expected_registry_fee: Some(DEFAULT_REGISTRY_FEE),
            call_timeout_ms: 120_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse from JSON and validate
    pub fn from_json(json: &str) -> Result<Self, WasmXcmError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WasmXcmError> {
        if self.allowed_para_ids.is_empty() {
            return Err(WasmXcmError::Config(
                "allowedParaIds must not be empty".to_string(),
            ));
        }
        if self.fees.local_fee == 0 || self.fees.remote_fee == 0 {
            return Err(WasmXcmError::Config("fees must be non-zero".to_string()));
        }
        self.fees
            .reserve()
            .map_err(|e| WasmXcmError::Config(e.to_string()))?;
        if self.reward_per_wrap == 0 {
            return Err(WasmXcmError::Config(
                "rewardPerWrap must be non-zero".to_string(),
            ));
        }
        if self.call_timeout_ms == 0 {
            return Err(WasmXcmError::Config(
                "callTimeoutMs must be non-zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(WasmXcmError::Config(
                "retry.maxAttempts must be at least 1".to_string(),
            ));
        }

        let contracts = [
            ("copyrightRegistry", self.contracts.copyright_registry),
            ("wrapper", self.contracts.wrapper),
            ("xcmLibrary", self.contracts.xcm_library),
            ("xcmPrecompile", self.contracts.xcm_precompile),
        ];
        for (i, (name, addr)) in contracts.iter().enumerate() {
            if addr.is_zero() {
                return Err(WasmXcmError::Config(format!(
                    "contracts.{} must be set",
                    name
                )));
            }
            if contracts[..i].iter().any(|(_, other)| other == addr) {
                return Err(WasmXcmError::Config(format!(
                    "contracts.{} duplicates another contract address",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn codec(&self) -> AddressCodec {
        AddressCodec::new(self.address_format)
    }
}

fn serialize_u128_option<S>(value: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(&v.to_string()),
        None => serializer.serialize_none(),
    }
}
