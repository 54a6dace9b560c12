//! # Executor Port
//!
//! The boundary to whatever runs transaction payloads. The ledger only needs
//! the logs a transaction emitted and the contract storage slots it wants
//! written; value transfer, fees and nonces are handled by the ledger itself.

use crate::domain::ExecutionError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Log, SignedTransaction, StorageKey, StorageValue};

/// Block-level context handed to the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    pub block_height: u64,
    pub block_timestamp: u64,
    pub producer: Address,
    /// Position of the transaction within its block.
    pub tx_index: u32,
}

/// Contract storage write requested by an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageWrite {
    pub address: Address,
    pub key: StorageKey,
    /// All-zero clears the slot.
    pub value: StorageValue,
}

/// Side effects of a successful execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub logs: Vec<Log>,
    pub storage_writes: Vec<StorageWrite>,
}

/// Runs a transaction payload. Must be deterministic: every validator
/// re-executes the same block and has to reach the same state root.
pub trait TransactionExecutor: Send + Sync {
    fn execute(
        &self,
        ctx: &ExecutionContext,
        tx: &SignedTransaction,
    ) -> Result<ExecutionOutcome, ExecutionError>;
}
