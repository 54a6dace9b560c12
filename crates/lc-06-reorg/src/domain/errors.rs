//! Error types for chain reorganization.

use lc_01_state_trie::TrieError;
use lc_04_consensus::{ConsensusError, StoreError};
use lc_05_finality::FinalityError;
use shared_types::{ErrorClass, ErrorKind, Hash};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorgError {
    /// The competing tip does not outscore the canonical tip.
    #[error("Competing chain not better: score {candidate} vs canonical {canonical}")]
    NotBetter { candidate: u64, canonical: u64 },

    #[error("Unknown block: {}", hex::encode(.0))]
    UnknownBlock(Hash),

    #[error("No common ancestor between {} and {}", hex::encode(.a), hex::encode(.b))]
    NoCommonAncestor { a: Hash, b: Hash },

    #[error(transparent)]
    Finality(#[from] FinalityError),

    /// Undoing a block did not land on its parent's state root.
    #[error("Revert of {} produced {}, expected parent root {}", hex::encode(.block), hex::encode(.computed), hex::encode(.expected))]
    RevertMismatch {
        block: Hash,
        expected: Hash,
        computed: Hash,
    },

    #[error("Replay of {} failed: {source}", hex::encode(.block))]
    Replay { block: Hash, source: ConsensusError },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("State error: {0}")]
    State(#[from] TrieError),
}

impl ErrorClass for ReorgError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReorgError::NotBetter { .. } => ErrorKind::StaleOrdering,
            ReorgError::UnknownBlock(_) => ErrorKind::NotFound,
            ReorgError::NoCommonAncestor { .. } | ReorgError::RevertMismatch { .. } => {
                ErrorKind::InvariantViolation
            }
            ReorgError::Finality(e) => e.kind(),
            ReorgError::Replay { source, .. } => source.kind(),
            ReorgError::Store(e) => e.kind(),
            ReorgError::State(e) => e.kind(),
        }
    }
}

pub type ReorgResult<T> = Result<T, ReorgError>;
