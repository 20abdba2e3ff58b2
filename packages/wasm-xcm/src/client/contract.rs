//! Solidity call surface of the copyright registry, wrapper and XCM precompile

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use parity_scale_codec::Encode;

use super::TxReceipt;
use crate::types::Weight;
use crate::xcm::XcmProgram;

sol! {
    /// ERC-721 registry minting one token per registered work
    interface ICopyrightRegistry {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function registryFee() external view returns (uint256);
        function registerCopyrightAsset(string title, string description, string uri) external payable returns (uint256);
        function approve(address to, uint256 tokenId) external;
        function getApproved(uint256 tokenId) external view returns (address);
    }

    /// Wraps registered works into reward tokens and teleports them out
    interface ICopyrightWrapper {
        function wrapCopyright(address assetContract, uint256 tokenId) external;
        function balanceOf(address account) external view returns (uint256);
        function teleport(uint32 paraId, bytes32 beneficiary, uint128 amount) external;
    }

    /// XCM precompile
    interface IXcm {
        struct XcmWeight {
            uint64 refTime;
            uint64 proofSize;
        }

        function weighMessage(bytes message) external view returns (XcmWeight weight);
    }
}

/// A state-changing call submitted through [`super::ChainClient::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    RegisterCopyrightAsset {
        registry: Address,
        title: String,
        description: String,
        uri: String,
        /// Registration fee attached as native value
        value: U256,
    },
    Approve {
        registry: Address,
        operator: Address,
        token_id: U256,
    },
    WrapCopyright {
        wrapper: Address,
        asset_contract: Address,
        token_id: U256,
    },
    Teleport {
        wrapper: Address,
        para_id: u32,
        beneficiary: B256,
        amount: u128,
        /// Execution weight from the precompile; not part of the calldata
        weight: Weight,
    },
}

impl ContractCall {
    /// Contract the call is sent to
    pub fn target(&self) -> Address {
        match self {
            ContractCall::RegisterCopyrightAsset { registry, .. }
            | ContractCall::Approve { registry, .. } => *registry,
            ContractCall::WrapCopyright { wrapper, .. } | ContractCall::Teleport { wrapper, .. } => {
                *wrapper
            }
        }
    }

    /// Native value attached to the transaction
    pub fn value(&self) -> U256 {
        match self {
            ContractCall::RegisterCopyrightAsset { value, .. } => *value,
            _ => U256::ZERO,
        }
    }

    /// Solidity method name
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::RegisterCopyrightAsset { .. } => "registerCopyrightAsset",
            ContractCall::Approve { .. } => "approve",
            ContractCall::WrapCopyright { .. } => "wrapCopyright",
            ContractCall::Teleport { .. } => "teleport",
        }
    }

    /// ABI encoded calldata, selector included
    pub fn calldata(&self) -> Bytes {
        let encoded = match self {
            ContractCall::RegisterCopyrightAsset {
                title,
                description,
                uri,
                ..
            } => ICopyrightRegistry::registerCopyrightAssetCall {
                title: title.clone(),
                description: description.clone(),
                uri: uri.clone(),
            }
            .abi_encode(),
            ContractCall::Approve {
                operator, token_id, ..
            } => ICopyrightRegistry::approveCall {
                to: *operator,
                tokenId: *token_id,
            }
            .abi_encode(),
            ContractCall::WrapCopyright {
                asset_contract,
                token_id,
                ..
            } => ICopyrightWrapper::wrapCopyrightCall {
                assetContract: *asset_contract,
                tokenId: *token_id,
            }
            .abi_encode(),
            ContractCall::Teleport {
                para_id,
                beneficiary,
                amount,
                ..
            } => ICopyrightWrapper::teleportCall {
                paraId: *para_id,
                beneficiary: *beneficiary,
                amount: *amount,
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }
}

/// Calldata for `weighMessage` on the XCM precompile
pub fn weigh_message_calldata(program: &XcmProgram) -> Bytes {
    IXcm::weighMessageCall {
        message: Bytes::from(program.encode()),
    }
    .abi_encode()
    .into()
}

/// Token id minted by `registry` in this receipt
///
/// Looks for the ERC-721 `Transfer` log with a zero `from` topic.
pub fn extract_minted_token_id(receipt: &TxReceipt, registry: Address) -> Option<U256> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == registry)
        .find_map(|log| match log.topics.as_slice() {
            [signature, from, _to, token_id]
                if *signature == ICopyrightRegistry::Transfer::SIGNATURE_HASH
                    && Address::from_word(*from) == Address::ZERO =>
            {
                Some(U256::from_be_bytes(token_id.0))
            }
            _ => None,
        })
}
