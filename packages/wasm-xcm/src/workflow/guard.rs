//! At most one in-flight workflow per asset or account

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use parking_lot::Mutex;

use crate::error::WasmXcmError;

/// Identity a workflow run holds exclusively
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkflowKey {
    /// Asset not minted yet
    PendingAsset { registry: Address, uri: String },
    Asset { registry: Address, token_id: U256 },
    /// Account whose reward balance a run reads and spends
    Account(Address),
}

impl fmt::Display for WorkflowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowKey::PendingAsset { registry, uri } => write!(f, "asset {} at {}", uri, registry),
            WorkflowKey::Asset { registry, token_id } => {
                write!(f, "asset #{} at {}", token_id, registry)
            }
            WorkflowKey::Account(account) => write!(f, "account {}", account),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    keys: Arc<Mutex<HashSet<WorkflowKey>>>,
}

impl InFlightRegistry {
    /// Claim `key`, failing if another run holds it
    pub fn try_acquire(&self, key: WorkflowKey) -> Result<InFlightGuard, WasmXcmError> {
        self.try_acquire_all(vec![key])
    }

    /// Claim every key or none of them
    pub fn try_acquire_all(&self, keys: Vec<WorkflowKey>) -> Result<InFlightGuard, WasmXcmError> {
        let mut held = self.keys.lock();
        if let Some(taken) = keys.iter().find(|key| held.contains(*key)) {
            return Err(WasmXcmError::WorkflowAlreadyInProgress(taken.to_string()));
        }
        held.extend(keys.iter().cloned());
        drop(held);

        Ok(InFlightGuard {
            registry: self.clone(),
            keys,
        })
    }

    pub fn is_in_flight(&self, key: &WorkflowKey) -> bool {
        self.keys.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

/// Releases every key it holds on drop
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    keys: Vec<WorkflowKey>,
}

impl InFlightGuard {
    /// Also hold `key` until this guard drops. Returns false if already held.
    pub fn track(&mut self, key: WorkflowKey) -> bool {
        if !self.registry.keys.lock().insert(key.clone()) {
            return false;
        }
        self.keys.push(key);
        true
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut keys = self.registry.keys.lock();
        for key in &self.keys {
            keys.remove(key);
        }
    }
}
