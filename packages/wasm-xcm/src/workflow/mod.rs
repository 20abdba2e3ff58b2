//! Register, approve, wrap and teleport as one tracked workflow
//!
//! [`TransferOrchestrator`] drives a run through the [`Stage`]s in order,
//! waiting for each transaction to be included before moving on. Input
//! problems are returned synchronously as [`WasmXcmError`] before anything
//! touches the chain; everything that goes wrong afterwards ends the run in
//! [`WorkflowState::Failed`] and is returned together with a
//! [`WorkflowReport`] of the steps that did finalize. Nothing is rolled back.
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = TransferOrchestrator::new(client, BridgeConfig::default(), Session { account })?;
//! let outcome = orchestrator.run(request, &CancelHandle::new()).await?;
//! assert_eq!(outcome.state, WorkflowState::Completed);
//! ```

mod cancel;
mod guard;
mod retry;
mod state;

pub use cancel::CancelHandle;
pub use guard::{InFlightGuard, InFlightRegistry, WorkflowKey};
pub use retry::RetryPolicy;
pub use state::{FailureCause, Stage, WorkflowState};

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use crate::address::AddressCodec;
use crate::client::{extract_minted_token_id, ChainClient, ChainError, ContractCall, TxReceipt};
use crate::config::BridgeConfig;
use crate::error::WasmXcmError;
use crate::types::{Asset, AssetDraft, TeleportRequest, Weight, WrapRecord};
use crate::xcm::{build_teleport, XcmProgram};
use retry::{CallFailure, CallKind};

/// The account every submission is signed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub account: Address,
}

/// Teleport as entered by the user, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeleportIntent {
    pub destination_para_id: u32,
    /// SS58 address of the beneficiary on the destination chain
    pub beneficiary: String,
    /// Amount in planck
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRequest {
    pub asset: AssetDraft,
    pub teleport: TeleportIntent,
}

/// What a run achieved, filled in as steps finalize
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowReport {
    pub asset: Option<Asset>,
    pub registration_tx: Option<B256>,
    /// `None` when the wrapper was already approved
    pub approval_tx: Option<B256>,
    pub wrap: Option<WrapRecord>,
    pub wrap_tx: Option<B256>,
    pub program: Option<XcmProgram>,
    pub weight: Option<Weight>,
    pub teleport: Option<TxReceipt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub state: WorkflowState,
    pub report: WorkflowReport,
}

impl WorkflowOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == WorkflowState::Completed
    }
}

/// Progress notification delivered to [`TransferOrchestrator::subscribe`]rs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    StageEntered(Stage),
    TxConfirmed {
        stage: Stage,
        tx_hash: B256,
        block_number: u64,
    },
    Finished(WorkflowState),
}

struct SessionState {
    account: Address,
    /// Bumped on every invalidation
    epoch: u64,
    validated_epoch: Option<u64>,
}

struct Inner<C> {
    client: C,
    config: BridgeConfig,
    codec: AddressCodec,
    session: RwLock<SessionState>,
    in_flight: InFlightRegistry,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<WorkflowEvent>>>,
}

/// Runs copyright wrap and teleport workflows against a [`ChainClient`]
///
/// Cheap to clone; clones share the session, the in-flight registry and the
/// subscribers.
pub struct TransferOrchestrator<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for TransferOrchestrator<C> {
    fn clone(&self) -> Self {
        TransferOrchestrator {
            inner: self.inner.clone(),
        }
    }
}

impl<C: ChainClient> TransferOrchestrator<C> {
    pub fn new(client: C, config: BridgeConfig, session: Session) -> Result<Self, WasmXcmError> {
        config.validate()?;
        let codec = config.codec();
        Ok(TransferOrchestrator {
            inner: Arc::new(Inner {
                client,
                config,
                codec,
                session: RwLock::new(SessionState {
                    account: session.account,
                    epoch: 0,
                    validated_epoch: None,
                }),
                in_flight: InFlightRegistry::default(),
                subscribers: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn client(&self) -> &C {
        &self.inner.client
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn account(&self) -> Address {
        self.inner.session.read().account
    }

    pub fn is_in_flight(&self, key: &WorkflowKey) -> bool {
        self.inner.in_flight.is_in_flight(key)
    }

    /// Receive [`WorkflowEvent`]s for every subsequent run
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<WorkflowEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers.lock().push(tx);
        rx
    }

    /// Mark the session stale, e.g. after the wallet switched chain
    ///
    /// Runs in flight fail with `SessionInvalidated` before their next
    /// submission; the next run validates again.
    pub fn invalidate_session(&self) {
        let mut session = self.inner.session.write();
        session.epoch += 1;
        session.validated_epoch = None;
        tracing::warn!(account = %session.account, epoch = session.epoch, "Session invalidated");
    }

    /// Invalidate the session and continue as `account`
    pub fn switch_account(&self, account: Address) {
        self.inner.session.write().account = account;
        self.invalidate_session();
    }

    /// Check chain id, deployed contracts and registry fee now
    pub async fn revalidate_session(&self) -> Result<(), FailureCause> {
        let epoch = self.inner.session.read().epoch;
        self.inner
            .validate_session(epoch, &CancelHandle::new())
            .await
    }

    /// Decode and validate a teleport, and build its XCM program
    pub fn prepare_teleport(
        &self,
        intent: &TeleportIntent,
    ) -> Result<(TeleportRequest, XcmProgram), WasmXcmError> {
        let beneficiary = self.inner.codec.decode(&intent.beneficiary)?;
        let request =
            TeleportRequest::new(intent.destination_para_id, beneficiary, intent.amount);
        request.validate(&self.inner.config.allowed_para_ids)?;
        let program = build_teleport(&request, &self.inner.config.fees)?;
        Ok((request, program))
    }

    /// Register a new asset, wrap it and teleport part of the reward
    pub async fn run(
        &self,
        request: WorkflowRequest,
        cancel: &CancelHandle,
    ) -> Result<WorkflowOutcome, WasmXcmError> {
        request.asset.validate()?;
        let (teleport, program) = self.prepare_teleport(&request.teleport)?;
        let (account, epoch) = self.inner.snapshot();
        let guard = self.inner.in_flight.try_acquire_all(vec![
            WorkflowKey::PendingAsset {
                registry: self.inner.config.contracts.copyright_registry,
                uri: request.asset.uri.clone(),
            },
            WorkflowKey::Account(account),
        ])?;

        let mut run = Run::start(&self.inner, guard, cancel, account, epoch);
        let result = run.full(request.asset, &teleport, program).await;
        Ok(run.finish(result))
    }

    /// Wrap an already registered asset and teleport part of the reward
    pub async fn wrap_and_teleport(
        &self,
        asset: Asset,
        teleport: TeleportIntent,
        cancel: &CancelHandle,
    ) -> Result<WorkflowOutcome, WasmXcmError> {
        let registry = self.inner.config.contracts.copyright_registry;
        if asset.contract_address != registry {
            return Err(WasmXcmError::InvalidInput(format!(
                "Asset contract {} is not the configured registry {}",
                asset.contract_address, registry
            )));
        }
        let (teleport, program) = self.prepare_teleport(&teleport)?;
        let (account, epoch) = self.inner.snapshot();
        let guard = self.inner.in_flight.try_acquire_all(vec![
            WorkflowKey::Asset {
                registry,
                token_id: asset.token_id,
            },
            WorkflowKey::Account(account),
        ])?;

        let mut run = Run::start(&self.inner, guard, cancel, account, epoch);
        run.report.asset = Some(asset.clone());
        let result = run.from_registered(asset, &teleport, program).await;
        Ok(run.finish(result))
    }

    /// Teleport reward tokens the session account already holds
    pub async fn teleport(
        &self,
        teleport: TeleportIntent,
        cancel: &CancelHandle,
    ) -> Result<WorkflowOutcome, WasmXcmError> {
        let (teleport, program) = self.prepare_teleport(&teleport)?;
        let (account, epoch) = self.inner.snapshot();
        let guard = self
            .inner
            .in_flight
            .try_acquire(WorkflowKey::Account(account))?;

        let mut run = Run::start(&self.inner, guard, cancel, account, epoch);
        let result = run.teleport_only(&teleport, program).await;
        Ok(run.finish(result))
    }
}

impl<C: ChainClient> Inner<C> {
    fn snapshot(&self) -> (Address, u64) {
        let session = self.session.read();
        (session.account, session.epoch)
    }

    async fn read<T, F, Fut>(
        &self,
        label: &str,
        cancel: &CancelHandle,
        op: F,
    ) -> Result<T, FailureCause>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChainError>>,
    {
        retry::retry(
            &self.config.retry,
            CallKind::Read,
            self.config.call_timeout(),
            label,
            cancel,
            op,
        )
        .await
        .map_err(CallFailure::into_cause)
    }

    async fn validate_session(&self, epoch: u64, cancel: &CancelHandle) -> Result<(), FailureCause> {
        let contracts = &self.config.contracts;

        let chain_id = self.read("chainId", cancel, move || self.client.chain_id()).await?;
        if chain_id != self.config.chain_id {
            return Err(FailureCause::ConfigMismatch(format!(
                "Connected to chain {} but configured for {}",
                chain_id, self.config.chain_id
            )));
        }

        for (name, address) in [
            ("copyright registry", contracts.copyright_registry),
            ("wrapper", contracts.wrapper),
            ("XCM library", contracts.xcm_library),
            ("XCM precompile", contracts.xcm_precompile),
        ] {
            let code = self
                .read("getCode", cancel, move || self.client.get_code(address))
                .await?;
            if code.is_empty() {
                return Err(FailureCause::ConfigMismatch(format!(
                    "No code deployed for {} at {}",
                    name, address
                )));
            }
        }

        let registry = contracts.copyright_registry;
        let fee = self
            .read("registryFee", cancel, move || self.client.registry_fee(registry))
            .await?;
        self.check_registry_fee(fee)?;

        let mut session = self.session.write();
        if session.epoch != epoch {
            return Err(FailureCause::SessionInvalidated);
        }
        session.validated_epoch = Some(epoch);
        tracing::info!(chain_id, account = %session.account, "Session validated");
        Ok(())
    }

    fn check_registry_fee(&self, fee: U256) -> Result<(), FailureCause> {
        match self.config.expected_registry_fee {
            Some(expected) if fee != U256::from(expected) => {
                Err(FailureCause::ConfigMismatch(format!(
                    "Registry fee is {} but {} was expected",
                    fee, expected
                )))
            }
            _ => Ok(()),
        }
    }

    fn emit(&self, event: WorkflowEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// One workflow run; owns its in-flight guard
///
/// The guard always covers the session account, so balance deltas observed
/// by a run are caused by that run alone.
struct Run<'a, C> {
    inner: &'a Inner<C>,
    cancel: &'a CancelHandle,
    account: Address,
    epoch: u64,
    stage: Stage,
    guard: InFlightGuard,
    report: WorkflowReport,
}

impl<'a, C: ChainClient> Run<'a, C> {
    fn start(
        inner: &'a Inner<C>,
        guard: InFlightGuard,
        cancel: &'a CancelHandle,
        account: Address,
        epoch: u64,
    ) -> Self {
        tracing::info!(%account, "Workflow started");
        Run {
            inner,
            cancel,
            account,
            epoch,
            stage: Stage::Idle,
            guard,
            report: WorkflowReport::default(),
        }
    }

    async fn full(
        &mut self,
        draft: AssetDraft,
        teleport: &TeleportRequest,
        program: XcmProgram,
    ) -> Result<(), FailureCause> {
        self.ensure_session().await?;
        let asset = self.register(draft).await?;
        self.approve(&asset).await?;
        self.wrap(asset).await?;
        self.teleport(teleport, program).await
    }

    async fn from_registered(
        &mut self,
        asset: Asset,
        teleport: &TeleportRequest,
        program: XcmProgram,
    ) -> Result<(), FailureCause> {
        self.ensure_session().await?;
        self.approve(&asset).await?;
        self.wrap(asset).await?;
        self.teleport(teleport, program).await
    }

    async fn teleport_only(
        &mut self,
        teleport: &TeleportRequest,
        program: XcmProgram,
    ) -> Result<(), FailureCause> {
        self.ensure_session().await?;
        self.teleport(teleport, program).await
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal transition {} -> {}",
            self.stage,
            next
        );
        tracing::info!(from = %self.stage, stage = %next, "Workflow stage entered");
        self.stage = next;
        self.inner.emit(WorkflowEvent::StageEntered(next));
    }

    async fn ensure_session(&mut self) -> Result<(), FailureCause> {
        let validated = self.inner.session.read().validated_epoch == Some(self.epoch);
        if validated {
            return Ok(());
        }
        self.inner.validate_session(self.epoch, self.cancel).await
    }

    fn check_session(&self) -> Result<(), FailureCause> {
        if self.inner.session.read().epoch != self.epoch {
            return Err(FailureCause::SessionInvalidated);
        }
        Ok(())
    }

    async fn submit(&mut self, call: ContractCall) -> Result<TxReceipt, FailureCause> {
        self.check_session()?;

        let inner = self.inner;
        let account = self.account;
        let method = call.method();
        let call = &call;
        let receipt = retry::retry(
            &inner.config.retry,
            CallKind::Submit,
            inner.config.call_timeout(),
            method,
            self.cancel,
            move || inner.client.submit(account, call),
        )
        .await
        .map_err(CallFailure::into_cause)?;

        tracing::info!(
            stage = %self.stage,
            method,
            tx_hash = %receipt.tx_hash,
            block = receipt.block_number,
            "Transaction confirmed"
        );
        inner.emit(WorkflowEvent::TxConfirmed {
            stage: self.stage,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        });
        Ok(receipt)
    }

    async fn reward_balance(&self) -> Result<U256, FailureCause> {
        let inner = self.inner;
        let wrapper = inner.config.contracts.wrapper;
        let account = self.account;
        inner
            .read("balanceOf", self.cancel, move || {
                inner.client.balance_of(wrapper, account)
            })
            .await
    }

    async fn register(&mut self, draft: AssetDraft) -> Result<Asset, FailureCause> {
        self.advance(Stage::Registering);
        let inner = self.inner;
        let registry = inner.config.contracts.copyright_registry;

        let fee = inner
            .read("registryFee", self.cancel, move || {
                inner.client.registry_fee(registry)
            })
            .await?;
        inner.check_registry_fee(fee)?;

        let receipt = self
            .submit(ContractCall::RegisterCopyrightAsset {
                registry,
                title: draft.title.clone(),
                description: draft.description.clone(),
                uri: draft.uri.clone(),
                value: fee,
            })
            .await?;
        self.report.registration_tx = Some(receipt.tx_hash);

        let token_id =
            extract_minted_token_id(&receipt, registry).ok_or(FailureCause::EventNotFound)?;
        let key = WorkflowKey::Asset { registry, token_id };
        if !self.guard.track(key.clone()) {
            return Err(FailureCause::AssetInFlight(key.to_string()));
        }

        let asset = Asset::from_draft(draft, registry, token_id);
        tracing::info!(%token_id, uri = %asset.uri, "Asset registered");
        self.report.asset = Some(asset.clone());
        Ok(asset)
    }

    async fn approve(&mut self, asset: &Asset) -> Result<(), FailureCause> {
        self.advance(Stage::Approving);
        let inner = self.inner;
        let wrapper = inner.config.contracts.wrapper;
        let registry = asset.contract_address;
        let token_id = asset.token_id;

        let approved = inner
            .read("getApproved", self.cancel, move || {
                inner.client.get_approved(registry, token_id)
            })
            .await?;
        if approved == wrapper {
            tracing::info!(%token_id, "Wrapper already approved");
            return Ok(());
        }

        let receipt = self
            .submit(ContractCall::Approve {
                registry,
                operator: wrapper,
                token_id,
            })
            .await?;
        self.report.approval_tx = Some(receipt.tx_hash);
        Ok(())
    }

    async fn wrap(&mut self, asset: Asset) -> Result<(), FailureCause> {
        self.advance(Stage::Wrapping);
        let wrapper = self.inner.config.contracts.wrapper;

        let before = self.reward_balance().await?;
        let receipt = self
            .submit(ContractCall::WrapCopyright {
                wrapper,
                asset_contract: asset.contract_address,
                token_id: asset.token_id,
            })
            .await?;
        self.report.wrap_tx = Some(receipt.tx_hash);
        let after = self.reward_balance().await?;

        let expected = U256::from(self.inner.config.reward_per_wrap);
        let actual = after.saturating_sub(before);
        if after < before || actual != expected {
            return Err(FailureCause::RewardInvariantViolated { expected, actual });
        }

        self.advance(Stage::RewardCredited);
        self.report.wrap = Some(WrapRecord {
            asset,
            wrapped_by: self.account,
            reward_minted: actual,
        });
        Ok(())
    }

    async fn teleport(
        &mut self,
        request: &TeleportRequest,
        program: XcmProgram,
    ) -> Result<(), FailureCause> {
        self.advance(Stage::TeleportEstimating);
        let weight = self.estimate(&program).await;
        self.report.program = Some(program);
        let weight = weight?;
        self.report.weight = Some(weight);

        self.advance(Stage::Teleporting);
        let before = self.reward_balance().await?;
        let receipt = self
            .submit(ContractCall::Teleport {
                wrapper: self.inner.config.contracts.wrapper,
                para_id: request.destination_para_id,
                beneficiary: B256::from(*request.beneficiary.raw()),
                amount: request.amount,
                weight,
            })
            .await?;
        self.report.teleport = Some(receipt);
        let after = self.reward_balance().await?;

        let expected = U256::from(request.amount);
        let actual = before.saturating_sub(after);
        if after > before || actual != expected {
            return Err(FailureCause::TeleportAmountMismatch { expected, actual });
        }

        tracing::info!(
            para_id = request.destination_para_id,
            beneficiary = %request.beneficiary,
            amount = %request.amount,
            "Teleport confirmed"
        );
        Ok(())
    }

    /// Weigh `program`, retrying exactly once on any failure
    async fn estimate(&self, program: &XcmProgram) -> Result<Weight, FailureCause> {
        let client = &self.inner.client;
        let timeout = self.inner.config.call_timeout();

        let weight = match retry::with_timeout(
            CallKind::Read,
            timeout,
            client.estimate_weight(program),
        )
        .await
        {
            Ok(weight) => weight,
            Err(error) => {
                tracing::warn!(%error, "Weight estimation failed, retrying once");
                retry::with_timeout(CallKind::Read, timeout, client.estimate_weight(program))
                    .await
                    .map_err(|error| FailureCause::from_chain(error, 2))?
            }
        };

        tracing::debug!(
            ref_time = weight.ref_time,
            proof_size = weight.proof_size,
            "Estimated teleport weight"
        );
        Ok(weight)
    }

    fn finish(self, result: Result<(), FailureCause>) -> WorkflowOutcome {
        let state = match result {
            Ok(()) => {
                debug_assert!(self.stage.can_complete());
                tracing::info!(account = %self.account, "Workflow completed");
                WorkflowState::Completed
            }
            Err(cause) => {
                match &cause {
                    FailureCause::Cancelled => {
                        tracing::warn!(stage = %self.stage, "Workflow cancelled")
                    }
                    cause if cause.is_invariant_violation() => {
                        tracing::error!(stage = %self.stage, %cause, "Chain invariant violated")
                    }
                    cause => tracing::error!(stage = %self.stage, %cause, "Workflow failed"),
                }
                WorkflowState::Failed {
                    at: self.stage,
                    cause,
                }
            }
        };

        self.inner.emit(WorkflowEvent::Finished(state.clone()));
        WorkflowOutcome {
            state,
            report: self.report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockChainClient, MockMethod};
    use alloy_primitives::address;

    const ALICE: Address = address!("f24FF3a9CF04c71Dbc94D0b566f7A27B94566cac");

    fn orchestrator() -> TransferOrchestrator<MockChainClient> {
        let config = BridgeConfig::default();
        let client = MockChainClient::new(&config);
        TransferOrchestrator::new(client, config, Session { account: ALICE }).unwrap()
    }

    fn intent(amount: u128) -> TeleportIntent {
        TeleportIntent {
            destination_para_id: 1000,
            beneficiary: "13mEPECpownFgBYbssfq23V8xjm2oarxieMVoKAKME4L8JXn".to_string(),
            amount,
        }
    }

    #[test]
    fn test_prepare_teleport_validates_synchronously() {
        let orch = orchestrator();

        let (request, program) = orch.prepare_teleport(&intent(1_000_000_000_000)).unwrap();
        assert_eq!(request.destination_para_id, 1000);
        assert_eq!(program.instructions().len(), 3);

        let mut bad = intent(1_000_000_000_000);
        bad.destination_para_id = 2034;
        assert_eq!(
            orch.prepare_teleport(&bad).unwrap_err(),
            WasmXcmError::UnknownDestination(2034)
        );

        let mut bad = intent(1_000_000_000_000);
        bad.beneficiary = "13mEPECpownFgBYbssfq23V8xjm2oarxieMVoKAKME4L8JXo".to_string();
        assert!(matches!(
            orch.prepare_teleport(&bad),
            Err(WasmXcmError::InvalidAddressFormat(_))
        ));

        assert!(matches!(
            orch.prepare_teleport(&intent(1)),
            Err(WasmXcmError::AmountBelowFeeReserve { .. })
        ));
    }

    #[tokio::test]
    async fn test_standalone_teleport() {
        let orch = orchestrator();
        orch.client().set_balance(ALICE, U256::from(5_000_000_000_000u64));
        let mut events = orch.subscribe();

        let outcome = orch
            .teleport(intent(1_000_000_000_000), &CancelHandle::new())
            .await
            .unwrap();

        assert_eq!(outcome.state, WorkflowState::Completed);
        assert_eq!(orch.client().balance(ALICE), U256::from(4_000_000_000_000u64));
        assert_eq!(orch.client().submitted_methods(), ["teleport"]);
        assert!(!orch.is_in_flight(&WorkflowKey::Account(ALICE)));

        assert_eq!(
            events.recv().await,
            Some(WorkflowEvent::StageEntered(Stage::TeleportEstimating))
        );
        assert_eq!(
            events.recv().await,
            Some(WorkflowEvent::StageEntered(Stage::Teleporting))
        );
    }

    #[tokio::test]
    async fn test_session_validated_once() {
        let orch = orchestrator();
        orch.client().set_balance(ALICE, U256::from(5_000_000_000_000u64));

        for _ in 0..2 {
            let outcome = orch
                .teleport(intent(1_000_000_000_000), &CancelHandle::new())
                .await
                .unwrap();
            assert!(outcome.is_completed());
        }
        assert_eq!(orch.client().call_count(MockMethod::ChainId), 1);

        orch.invalidate_session();
        orch.revalidate_session().await.unwrap();
        assert_eq!(orch.client().call_count(MockMethod::ChainId), 2);
    }

    #[tokio::test]
    async fn test_wrong_chain_fails_at_idle() {
        let orch = orchestrator();
        orch.client().set_chain_id(1);

        let outcome = orch
            .teleport(intent(1_000_000_000_000), &CancelHandle::new())
            .await
            .unwrap();
        assert!(matches!(
            outcome.state,
            WorkflowState::Failed {
                at: Stage::Idle,
                cause: FailureCause::ConfigMismatch(_)
            }
        ));
        assert!(orch.client().submitted().is_empty());
    }

    #[tokio::test]
    async fn test_wrap_and_teleport_rejects_foreign_asset() {
        let orch = orchestrator();
        let asset = Asset {
            contract_address: address!("0000000000000000000000000000000000000001"),
            token_id: U256::from(1),
            title: "t".to_string(),
            description: "d".to_string(),
            uri: "ipfs://x".to_string(),
        };
        assert!(matches!(
            orch.wrap_and_teleport(asset, intent(1_000_000_000_000), &CancelHandle::new())
                .await,
            Err(WasmXcmError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_minted_asset_held_elsewhere_ends_run() {
        let orch = orchestrator();
        let registry = orch.config().contracts.copyright_registry;
        let _held = orch
            .inner
            .in_flight
            .try_acquire(WorkflowKey::Asset {
                registry,
                token_id: U256::from(1),
            })
            .unwrap();

        let request = WorkflowRequest {
            asset: AssetDraft {
                title: "t".to_string(),
                description: "d".to_string(),
                uri: "ipfs://x".to_string(),
            },
            teleport: intent(1_000_000_000_000),
        };
        let outcome = orch.run(request, &CancelHandle::new()).await.unwrap();

        assert!(matches!(
            outcome.state,
            WorkflowState::Failed {
                at: Stage::Registering,
                cause: FailureCause::AssetInFlight(_)
            }
        ));
        assert_eq!(orch.client().submitted_methods(), ["registerCopyrightAsset"]);
        assert!(!orch.is_in_flight(&WorkflowKey::Account(ALICE)));
    }
}
