//! Error types for the finality tracker.

use shared_types::{ErrorClass, ErrorKind, FinalityStatus, Hash};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalityError {
    #[error("Block not tracked: {}", hex::encode(.0))]
    UnknownBlock(Hash),

    /// Only `Pending -> Finalized` and `Pending -> Orphaned` exist.
    #[error("Invalid finality transition for {}: {from:?} -> {to:?}", hex::encode(.hash))]
    InvalidTransition {
        hash: Hash,
        from: FinalityStatus,
        to: FinalityStatus,
    },

    /// A reorg would revert a finalized block.
    #[error("Reorg to ancestor at height {ancestor_height} crosses finalized height {finalized_height}")]
    CrossesFinality {
        ancestor_height: u64,
        finalized_height: u64,
    },
}

impl ErrorClass for FinalityError {
    fn kind(&self) -> ErrorKind {
        match self {
            FinalityError::UnknownBlock(_) => ErrorKind::NotFound,
            FinalityError::InvalidTransition { .. } | FinalityError::CrossesFinality { .. } => {
                ErrorKind::InvariantViolation
            }
        }
    }
}

/// Result type for finality operations
pub type FinalityResult<T> = Result<T, FinalityError>;
