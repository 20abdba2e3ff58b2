//! Workflow states and terminal failure causes

use std::fmt;
use std::time::Duration;

use alloy_primitives::U256;
use thiserror::Error;

use crate::client::ChainError;

/// Non-terminal position of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Registering,
    Approving,
    Wrapping,
    RewardCredited,
    TeleportEstimating,
    Teleporting,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::Registering => "Registering",
            Stage::Approving => "Approving",
            Stage::Wrapping => "Wrapping",
            Stage::RewardCredited => "RewardCredited",
            Stage::TeleportEstimating => "TeleportEstimating",
            Stage::Teleporting => "Teleporting",
        }
    }

    /// Whether a run may move from `self` to `next`
    ///
    /// `Idle` may skip ahead to `Approving` (asset already registered) or to
    /// `TeleportEstimating` (standalone teleport).
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Idle, Stage::Registering)
                | (Stage::Idle, Stage::Approving)
                | (Stage::Idle, Stage::TeleportEstimating)
                | (Stage::Registering, Stage::Approving)
                | (Stage::Approving, Stage::Wrapping)
                | (Stage::Wrapping, Stage::RewardCredited)
                | (Stage::RewardCredited, Stage::TeleportEstimating)
                | (Stage::TeleportEstimating, Stage::Teleporting)
        )
    }

    /// Only `Teleporting` may complete a run
    pub fn can_complete(self) -> bool {
        self == Stage::Teleporting
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a run ended in [`WorkflowState::Failed`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    #[error("Chain unavailable after {attempts} attempt(s): {message}")]
    ChainUnavailable { attempts: u32, message: String },
    /// Revert reason exactly as reported by the chain
    #[error("Transaction reverted: {reason}")]
    TxReverted { reason: String },
    #[error("Transaction not confirmed within {waited:?}")]
    TxTimeout { waited: Duration },
    #[error("Transfer event not found in registration receipt")]
    EventNotFound,
    #[error("Reward invariant violated: expected +{expected}, observed +{actual}")]
    RewardInvariantViolated { expected: U256, actual: U256 },
    #[error("Teleport debited {actual}, expected {expected}")]
    TeleportAmountMismatch { expected: U256, actual: U256 },
    /// Connected chain or deployed contracts differ from the configuration
    #[error("Configuration mismatch: {0}")]
    ConfigMismatch(String),
    /// The minted asset is already claimed by another run
    #[error("Workflow already in progress for {0}")]
    AssetInFlight(String),
    #[error("Cancelled")]
    Cancelled,
    /// Account or chain changed while the run was in flight
    #[error("Session invalidated")]
    SessionInvalidated,
}

impl FailureCause {
    pub fn from_chain(err: ChainError, attempts: u32) -> Self {
        match err {
            ChainError::ChainUnavailable(message) => {
                FailureCause::ChainUnavailable { attempts, message }
            }
            ChainError::TxReverted { reason } => FailureCause::TxReverted { reason },
            ChainError::TxTimeout { waited } => FailureCause::TxTimeout { waited },
        }
    }

    /// Broken chain-side accounting rather than an operational failure
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            FailureCause::EventNotFound
                | FailureCause::RewardInvariantViolated { .. }
                | FailureCause::TeleportAmountMismatch { .. }
        )
    }
}

/// State of one workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Active(Stage),
    Completed,
    Failed { at: Stage, cause: FailureCause },
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowState::Active(_))
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        WorkflowState::Active(Stage::Idle)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::Active(stage) => write!(f, "{}", stage),
            WorkflowState::Completed => f.write_str("Completed"),
            WorkflowState::Failed { at, cause } => write!(f, "Failed at {}: {}", at, cause),
        }
    }
}
