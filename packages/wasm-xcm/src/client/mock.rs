//! In-memory simulation of the registry, wrapper and XCM precompile
//!
//! Behaves like the deployed contracts for the happy path and lets callers
//! inject the failures a live chain produces: dropped requests, reverts,
//! slow inclusion, misbehaving reward or teleport accounting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::contract::{ContractCall, ICopyrightRegistry};
use super::{ChainClient, ChainError, LogEntry, TxReceipt};
use crate::config::{BridgeConfig, DEFAULT_REGISTRY_FEE};
use crate::types::Weight;
use crate::xcm::XcmProgram;

/// Trait method, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockMethod {
    ChainId,
    GetCode,
    RegistryFee,
    BalanceOf,
    GetApproved,
    EstimateWeight,
    Submit,
}

/// Holds one submission after it reaches the mock until released
#[derive(Debug, Default)]
pub struct SubmitGate {
    entered: Notify,
    release: Notify,
}

impl SubmitGate {
    /// Resolves once the held submission has arrived
    pub async fn entered(&self) {
        self.entered.notified().await
    }

    /// Let the held submission execute
    pub fn release(&self) {
        self.release.notify_one()
    }
}

struct MockState {
    chain_id: u64,
    registry: Address,
    wrapper: Address,
    code: HashMap<Address, Bytes>,
    registry_fee: U256,
    reward: U256,
    teleport_debit: Option<U256>,
    weight: Weight,
    omit_mint_event: bool,
    next_token_id: U256,
    block_number: u64,
    balances: HashMap<Address, U256>,
    owners: HashMap<U256, Address>,
    approvals: HashMap<U256, Address>,
    unavailable: HashMap<MockMethod, u32>,
    delays: HashMap<MockMethod, Duration>,
    reverts: HashMap<&'static str, String>,
    holds: HashMap<&'static str, Arc<SubmitGate>>,
    calls: HashMap<MockMethod, u32>,
    submitted: Vec<ContractCall>,
}

/// [`ChainClient`] backed by in-memory contract state
pub struct MockChainClient {
    state: Mutex<MockState>,
}

impl MockChainClient {
    /// Deploy the contracts named in `config`
    ///
    /// The registry charges the configured expected fee and the wrapper mints
    /// `reward_per_wrap`, so a default run satisfies every invariant.
    pub fn new(config: &BridgeConfig) -> Self {
        let contracts = &config.contracts;
        let code = [
            contracts.copyright_registry,
            contracts.wrapper,
            contracts.xcm_library,
            contracts.xcm_precompile,
        ]
        .into_iter()
        .map(|addr| (addr, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40])))
        .collect();

        MockChainClient {
            state: Mutex::new(MockState {
                chain_id: config.chain_id,
                registry: contracts.copyright_registry,
                wrapper: contracts.wrapper,
                code,
                registry_fee: U256::from(
                    config.expected_registry_fee.unwrap_or(DEFAULT_REGISTRY_FEE),
                ),
                reward: U256::from(config.reward_per_wrap),
                teleport_debit: None,
                weight: Weight::new(1_000_000_000, 65_536),
                omit_mint_event: false,
                next_token_id: U256::from(1),
                block_number: 1_000,
                balances: HashMap::new(),
                owners: HashMap::new(),
                approvals: HashMap::new(),
                unavailable: HashMap::new(),
                delays: HashMap::new(),
                reverts: HashMap::new(),
                holds: HashMap::new(),
                calls: HashMap::new(),
                submitted: Vec::new(),
            }),
        }
    }

    pub fn set_balance(&self, owner: Address, amount: U256) {
        self.state.lock().balances.insert(owner, amount);
    }

    /// Reward token balance of `owner`
    pub fn balance(&self, owner: Address) -> U256 {
        self.state
            .lock()
            .balances
            .get(&owner)
            .copied()
            .unwrap_or_default()
    }

    pub fn owner_of(&self, token_id: U256) -> Option<Address> {
        self.state.lock().owners.get(&token_id).copied()
    }

    /// Mint an asset to `owner` outside of any workflow
    pub fn mint_to(&self, owner: Address) -> U256 {
        let mut state = self.state.lock();
        let token_id = state.next_token_id;
        state.next_token_id += U256::from(1);
        state.owners.insert(token_id, owner);
        token_id
    }

    pub fn set_approval(&self, token_id: U256, operator: Address) {
        self.state.lock().approvals.insert(token_id, operator);
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().chain_id = chain_id;
    }

    pub fn remove_code(&self, address: Address) {
        self.state.lock().code.remove(&address);
    }

    pub fn set_registry_fee(&self, fee: U256) {
        self.state.lock().registry_fee = fee;
    }

    /// Amount the wrapper actually mints per wrap
    pub fn set_reward(&self, reward: U256) {
        self.state.lock().reward = reward;
    }

    /// Amount actually debited by `teleport`, regardless of the requested amount
    pub fn set_teleport_debit(&self, debit: U256) {
        self.state.lock().teleport_debit = Some(debit);
    }

    pub fn set_weight(&self, weight: Weight) {
        self.state.lock().weight = weight;
    }

    /// Mint without emitting the `Transfer` event
    pub fn omit_mint_event(&self) {
        self.state.lock().omit_mint_event = true;
    }

    /// Fail the next `times` calls of `method` with `ChainUnavailable`
    pub fn fail_next(&self, method: MockMethod, times: u32) {
        self.state.lock().unavailable.insert(method, times);
    }

    /// Wait `delay` before answering every call of `method`
    pub fn set_delay(&self, method: MockMethod, delay: Duration) {
        self.state.lock().delays.insert(method, delay);
    }

    /// Revert the next submission of the contract method named `method`
    pub fn revert_next(&self, method: &'static str, reason: impl Into<String>) {
        self.state.lock().reverts.insert(method, reason.into());
    }

    /// Hold the next submission of `method` until the gate is released
    pub fn hold_submission(&self, method: &'static str) -> Arc<SubmitGate> {
        let gate = Arc::new(SubmitGate::default());
        self.state.lock().holds.insert(method, gate.clone());
        gate
    }

    /// Every submission that reached the chain, in order
    pub fn submitted(&self) -> Vec<ContractCall> {
        self.state.lock().submitted.clone()
    }

    pub fn submitted_methods(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .submitted
            .iter()
            .map(ContractCall::method)
            .collect()
    }

    pub fn call_count(&self, method: MockMethod) -> u32 {
        self.state
            .lock()
            .calls
            .get(&method)
            .copied()
            .unwrap_or_default()
    }

    async fn begin(&self, method: MockMethod) -> Result<(), ChainError> {
        let (delay, unavailable) = {
            let mut state = self.state.lock();
            *state.calls.entry(method).or_default() += 1;
            let unavailable = match state.unavailable.get_mut(&method) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            };
            (state.delays.get(&method).copied(), unavailable)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if unavailable {
            return Err(ChainError::ChainUnavailable(format!(
                "{:?}: connection refused",
                method
            )));
        }
        Ok(())
    }
}

impl MockState {
    fn execute(&mut self, from: Address, call: &ContractCall) -> Result<TxReceipt, ChainError> {
        if !self.code.contains_key(&call.target()) {
            return revert("call to non-contract account");
        }

        let mut logs = Vec::new();
        match call {
            ContractCall::RegisterCopyrightAsset {
                registry, value, ..
            } => {
                if *value < self.registry_fee {
                    return revert("Insufficient registration fee");
                }
                let token_id = self.next_token_id;
                self.next_token_id += U256::from(1);
                self.owners.insert(token_id, from);
                if !self.omit_mint_event {
                    logs.push(LogEntry {
                        address: *registry,
                        topics: vec![
                            ICopyrightRegistry::Transfer::SIGNATURE_HASH,
                            Address::ZERO.into_word(),
                            from.into_word(),
                            B256::from(token_id.to_be_bytes::<32>()),
                        ],
                        data: Bytes::new(),
                    });
                }
            }
            ContractCall::Approve {
                operator, token_id, ..
            } => {
                match self.owners.get(token_id) {
                    None => return revert("ERC721: invalid token ID"),
                    Some(owner) if *owner != from => {
                        return revert("ERC721: approve caller is not token owner")
                    }
                    Some(_) => {}
                }
                self.approvals.insert(*token_id, *operator);
            }
            ContractCall::WrapCopyright {
                wrapper,
                asset_contract,
                token_id,
            } => {
                if *asset_contract != self.registry {
                    return revert("Unknown asset contract");
                }
                if self.owners.get(token_id) != Some(&from) {
                    return revert("Caller does not own the asset");
                }
                if self.approvals.get(token_id) != Some(wrapper) {
                    return revert("ERC721: caller is not token owner or approved");
                }
                self.owners.insert(*token_id, *wrapper);
                self.approvals.remove(token_id);
                let balance = self.balances.entry(from).or_default();
                *balance += self.reward;
            }
            ContractCall::Teleport { amount, .. } => {
                let amount = U256::from(*amount);
                let balance = self.balances.get(&from).copied().unwrap_or_default();
                if balance < amount {
                    return revert("Insufficient balance");
                }
                let debit = self.teleport_debit.unwrap_or(amount);
                self.balances.insert(from, balance.saturating_sub(debit));
            }
        }

        self.block_number += 1;
        let mut preimage = self.block_number.to_be_bytes().to_vec();
        preimage.extend_from_slice(from.as_slice());
        preimage.extend_from_slice(&call.calldata());
        Ok(TxReceipt {
            tx_hash: keccak256(&preimage),
            block_number: self.block_number,
            logs,
        })
    }
}

fn revert<T>(reason: &str) -> Result<T, ChainError> {
    Err(ChainError::TxReverted {
        reason: reason.to_string(),
    })
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.begin(MockMethod::ChainId).await?;
        Ok(self.state.lock().chain_id)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, ChainError> {
        self.begin(MockMethod::GetCode).await?;
        Ok(self
            .state
            .lock()
            .code
            .get(&address)
            .cloned()
            .unwrap_or_default())
    }

    async fn registry_fee(&self, _registry: Address) -> Result<U256, ChainError> {
        self.begin(MockMethod::RegistryFee).await?;
        Ok(self.state.lock().registry_fee)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.begin(MockMethod::BalanceOf).await?;
        let state = self.state.lock();
        if token != state.wrapper {
            return Ok(U256::ZERO);
        }
        Ok(state.balances.get(&owner).copied().unwrap_or_default())
    }

    async fn get_approved(
        &self,
        _registry: Address,
        token_id: U256,
    ) -> Result<Address, ChainError> {
        self.begin(MockMethod::GetApproved).await?;
        let state = self.state.lock();
        if !state.owners.contains_key(&token_id) {
            return revert("ERC721: invalid token ID");
        }
        Ok(state
            .approvals
            .get(&token_id)
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn estimate_weight(&self, program: &XcmProgram) -> Result<Weight, ChainError> {
        self.begin(MockMethod::EstimateWeight).await?;
        if program.instructions().is_empty() {
            return revert("empty XCM program");
        }
        Ok(self.state.lock().weight)
    }

    async fn submit(&self, from: Address, call: &ContractCall) -> Result<TxReceipt, ChainError> {
        self.begin(MockMethod::Submit).await?;

        let gate = {
            let mut state = self.state.lock();
            state.submitted.push(call.clone());
            state.holds.remove(call.method())
        };
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let mut state = self.state.lock();
        if let Some(reason) = state.reverts.remove(call.method()) {
            return Err(ChainError::TxReverted { reason });
        }
        state.execute(from, call)
    }
}
