use crate::domain::ExecutionError;
use crate::ports::{ExecutionContext, ExecutionOutcome, TransactionExecutor};
use shared_crypto::keccak256;
use shared_types::{Hash, Log, SignedTransaction};

/// Executor for plain value transfers: emits a single `Transfer` log and
/// touches no storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferExecutor;

impl TransferExecutor {
    /// Topic identifying transfer logs.
    pub fn transfer_topic() -> Hash {
        keccak256(b"Transfer(address,address,uint256)")
    }
}

impl TransactionExecutor for TransferExecutor {
    fn execute(
        &self,
        _ctx: &ExecutionContext,
        tx: &SignedTransaction,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let mut from = [0u8; 32];
        from[12..].copy_from_slice(&tx.from);
        let mut to = [0u8; 32];
        to[12..].copy_from_slice(&tx.to);
        let mut value = [0u8; 32];
        tx.value.to_big_endian(&mut value);

        Ok(ExecutionOutcome {
            logs: vec![Log {
                address: tx.to,
                topics: vec![Self::transfer_topic(), from, to],
                data: value.to_vec(),
            }],
            storage_writes: Vec::new(),
        })
    }
}
