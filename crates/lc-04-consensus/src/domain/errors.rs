//! Error types for the consensus engine.

use super::stage::ValidationStage;
use lc_01_state_trie::TrieError;
use lc_02_execution::TxRejection;
use shared_types::{ErrorClass, ErrorKind, Hash};
use thiserror::Error;

/// Block store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Block not found: {}", hex::encode(.0))]
    BlockNotFound(Hash),

    #[error("No undo journal for block {}", hex::encode(.0))]
    MissingUndo(Hash),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl ErrorClass for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::BlockNotFound(_) => ErrorKind::NotFound,
            StoreError::MissingUndo(_) => ErrorKind::InvariantViolation,
            StoreError::Backend(_) => ErrorKind::Unavailable,
        }
    }
}

/// Consensus error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("Unknown parent block: {}", hex::encode(.0))]
    UnknownParent(Hash),

    #[error("Block already known: {}", hex::encode(.0))]
    AlreadyKnown(Hash),

    /// The exact block was rejected before. A corrected block from the same
    /// producer has a different hash and is evaluated normally.
    #[error("Block previously rejected: {}", hex::encode(.0))]
    AlreadyRejected(Hash),

    #[error("Invalid block height: expected {expected}, got {actual}")]
    InvalidHeight { expected: u64, actual: u64 },

    #[error("Invalid timestamp: block {block} < parent {parent}")]
    InvalidTimestamp { block: u64, parent: u64 },

    #[error("Transactions root mismatch: header {}, computed {}", hex::encode(.declared), hex::encode(.computed))]
    TransactionsRootMismatch { declared: Hash, computed: Hash },

    #[error("Block size {size} exceeds limit {limit}")]
    BlockTooLarge { size: u64, limit: u64 },

    #[error("Transaction {index} invalid: {reason}")]
    InvalidTransaction { index: usize, reason: TxRejection },

    #[error("State root mismatch: header {}, computed {}", hex::encode(.declared), hex::encode(.computed))]
    StateRootMismatch { declared: Hash, computed: Hash },

    #[error("Illegal validation transition {from:?} -> {to:?}")]
    IllegalTransition {
        from: ValidationStage,
        to: ValidationStage,
    },

    #[error("Genesis block is invalid: {0}")]
    InvalidGenesis(String),

    #[error("State error: {0}")]
    State(#[from] TrieError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ConsensusError {
    /// Whether the block itself is at fault, so its hash should be remembered
    /// as rejected. Missing parents and unreadable state are not the block's
    /// fault.
    pub fn is_permanent(&self) -> bool {
        match self {
            ConsensusError::UnknownParent(_)
            | ConsensusError::AlreadyKnown(_)
            | ConsensusError::AlreadyRejected(_)
            | ConsensusError::IllegalTransition { .. }
            | ConsensusError::State(_)
            | ConsensusError::Store(_) => false,
            ConsensusError::InvalidTransaction { reason, .. } => {
                !matches!(reason, TxRejection::State(_))
            }
            _ => true,
        }
    }

    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ConsensusError::UnknownParent(_) => "unknown_parent",
            ConsensusError::AlreadyKnown(_) => "already_known",
            ConsensusError::AlreadyRejected(_) => "already_rejected",
            ConsensusError::InvalidHeight { .. } => "height",
            ConsensusError::InvalidTimestamp { .. } => "timestamp",
            ConsensusError::TransactionsRootMismatch { .. } => "transactions_root",
            ConsensusError::BlockTooLarge { .. } => "size",
            ConsensusError::InvalidTransaction { .. } => "transaction",
            ConsensusError::StateRootMismatch { .. } => "state_root",
            ConsensusError::IllegalTransition { .. } => "transition",
            ConsensusError::InvalidGenesis(_) => "genesis",
            ConsensusError::State(_) => "state",
            ConsensusError::Store(_) => "store",
        }
    }
}

impl ErrorClass for ConsensusError {
    fn kind(&self) -> ErrorKind {
        match self {
            ConsensusError::UnknownParent(_) => ErrorKind::Unavailable,
            ConsensusError::AlreadyKnown(_) => ErrorKind::StaleOrdering,
            ConsensusError::AlreadyRejected(_)
            | ConsensusError::InvalidHeight { .. }
            | ConsensusError::InvalidTimestamp { .. }
            | ConsensusError::TransactionsRootMismatch { .. }
            | ConsensusError::BlockTooLarge { .. }
            | ConsensusError::InvalidTransaction { .. }
            | ConsensusError::InvalidGenesis(_) => ErrorKind::Malformed,
            ConsensusError::StateRootMismatch { .. } | ConsensusError::IllegalTransition { .. } => {
                ErrorKind::InvariantViolation
            }
            ConsensusError::State(e) => e.kind(),
            ConsensusError::Store(e) => e.kind(),
        }
    }
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
