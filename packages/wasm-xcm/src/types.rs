//! Shared types for the copyright wrap and teleport workflow

use alloy_primitives::{Address, U256};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::address::AccountRef;
use crate::error::WasmXcmError;

/// SS58 address format prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
    /// Polkadot mainnet (prefix 0, addresses start with '1')
    Polkadot = 0,
    /// Kusama (prefix 2)
    Kusama = 2,
    /// Substrate generic (prefix 42, addresses start with '5')
    Substrate = 42,
}

impl AddressFormat {
    /// Get the prefix value
    pub fn prefix(self) -> u16 {
        self as u16
    }

    /// Recognized format for a decoded prefix, if any
    pub fn from_prefix(prefix: u16) -> Option<Self> {
        match prefix {
            0 => Some(AddressFormat::Polkadot),
            2 => Some(AddressFormat::Kusama),
            42 => Some(AddressFormat::Substrate),
            _ => None,
        }
    }

    /// Get format from chain name
    pub fn from_chain_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "polkadot" | "statemint" | "polkadot asset hub" | "paseo" => AddressFormat::Polkadot,
            "kusama" | "statemine" | "kusama asset hub" => AddressFormat::Kusama,
            _ => AddressFormat::Substrate,
        }
    }
}

/// Registration input for a new copyright asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDraft {
    pub title: String,
    pub description: String,
    /// Content URI, e.g. `ipfs://...`
    pub uri: String,
}

impl AssetDraft {
    pub fn validate(&self) -> Result<(), WasmXcmError> {
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("uri", &self.uri),
        ] {
            if value.trim().is_empty() {
                return Err(WasmXcmError::InvalidInput(format!(
                    "Asset {} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// A minted copyright asset. Ownership is tracked by the registry contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub contract_address: Address,
    pub token_id: U256,
    pub title: String,
    pub description: String,
    pub uri: String,
}

impl Asset {
    pub fn from_draft(draft: AssetDraft, contract_address: Address, token_id: U256) -> Self {
        Asset {
            contract_address,
            token_id,
            title: draft.title,
            description: draft.description,
            uri: draft.uri,
        }
    }
}

/// Result of wrapping an asset into fungible reward tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapRecord {
    pub asset: Asset,
    pub wrapped_by: Address,
    pub reward_minted: U256,
}

/// A validated request to teleport `amount` plancks to `beneficiary` on a parachain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportRequest {
    pub destination_para_id: u32,
    pub beneficiary: AccountRef,
    /// Amount in planck
    pub amount: u128,
}

impl TeleportRequest {
    pub fn new(destination_para_id: u32, beneficiary: AccountRef, amount: u128) -> Self {
        TeleportRequest {
            destination_para_id,
            beneficiary,
            amount,
        }
    }

    /// Reject zero amounts and destinations outside `allowed_para_ids`
    pub fn validate(&self, allowed_para_ids: &[u32]) -> Result<(), WasmXcmError> {
        if self.amount == 0 {
            return Err(WasmXcmError::InvalidInput(
                "Teleport amount must be greater than zero".to_string(),
            ));
        }
        if !allowed_para_ids.contains(&self.destination_para_id) {
            return Err(WasmXcmError::UnknownDestination(self.destination_para_id));
        }
        Ok(())
    }
}

/// Execution weight reported by the XCM precompile
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    parity_scale_codec::Encode,
    parity_scale_codec::Decode,
)]
#[serde(rename_all = "camelCase")]
pub struct Weight {
    #[codec(compact)]
    pub ref_time: u64,
    #[codec(compact)]
    pub proof_size: u64,
}

impl Weight {
    pub fn new(ref_time: u64, proof_size: u64) -> Self {
        Weight {
            ref_time,
            proof_size,
        }
    }
}

/// Deserialize u128 from either a number or string
pub(crate) fn deserialize_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    struct U128Visitor;

    impl<'de> de::Visitor<'de> for U128Visitor {
        type Value = u128;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a u128 as number or string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<u128, E>
        where
            E: de::Error,
        {
            Ok(value as u128)
        }

        fn visit_u128<E>(self, value: u128) -> Result<u128, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<u128, E>
        where
            E: de::Error,
        {
            if value >= 0 {
                Ok(value as u128)
            } else {
                Err(E::custom("negative values not allowed"))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<u128, E>
        where
            E: de::Error,
        {
            value.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U128Visitor)
}

/// Optional variant of [`deserialize_u128`]; `null` maps to `None`
pub(crate) fn deserialize_u128_option<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_u128")] u128);

    Option::<Wrapper>::deserialize(deserializer).map(|w| w.map(|Wrapper(v)| v))
}

/// Serialize u128 as a decimal string (BigInt-safe for JS callers)
pub(crate) fn serialize_u128<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}
