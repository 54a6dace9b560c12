//! Transaction pool error types.

use super::entities::{Address, Hash, U256};
use lc_02_execution::TxRejection;
use shared_types::{ErrorClass, ErrorKind};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Duplicate transaction: {}", hex::encode(.0))]
    DuplicateTransaction(Hash),

    /// Nonce already consumed on-chain (replay or late arrival).
    #[error("Stale nonce: expected at least {expected}, got {actual}")]
    StaleNonce { expected: u64, actual: u64 },

    #[error("Nonce {actual} too far ahead (expected {expected}, max gap {max_gap})")]
    NonceTooFarAhead {
        expected: u64,
        actual: u64,
        max_gap: u64,
    },

    #[error("Insufficient fee bump: {old_fee} -> {new_fee} (min {min_bump_percent}%)")]
    InsufficientFeeBump {
        old_fee: U256,
        new_fee: U256,
        min_bump_percent: u64,
    },

    #[error("Sender {} reached limit of {limit} transactions", hex::encode(.address))]
    SenderLimitReached { address: Address, limit: usize },

    #[error("Pool full at {capacity} transactions")]
    PoolFull { capacity: usize },

    #[error("Transaction of {size} bytes exceeds {max}")]
    Oversized { size: u64, max: u64 },

    #[error("Transaction not found: {}", hex::encode(.0))]
    TransactionNotFound(Hash),

    /// Failed admission checks against current state.
    #[error("Rejected: {0}")]
    Rejected(#[from] TxRejection),
}

impl ErrorClass for PoolError {
    fn kind(&self) -> ErrorKind {
        match self {
            PoolError::DuplicateTransaction(_)
            | PoolError::StaleNonce { .. }
            | PoolError::NonceTooFarAhead { .. }
            | PoolError::InsufficientFeeBump { .. } => ErrorKind::StaleOrdering,
            PoolError::SenderLimitReached { .. } | PoolError::PoolFull { .. } => {
                ErrorKind::Unavailable
            }
            PoolError::Oversized { .. } => ErrorKind::Malformed,
            PoolError::TransactionNotFound(_) => ErrorKind::NotFound,
            PoolError::Rejected(rejection) => rejection.kind(),
        }
    }
}

/// Failure delivering a transaction to a peer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GossipError {
    #[error("Peer {0} unreachable")]
    Unreachable(String),

    #[error("Transport closed")]
    Closed,
}

impl ErrorClass for GossipError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PoolError::InsufficientFeeBump {
            old_fee: U256::from(100u64),
            new_fee: U256::from(105u64),
            min_bump_percent: 10,
        };
        assert!(err.to_string().contains("fee bump"));
        assert!(err.to_string().contains("10%"));
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            PoolError::StaleNonce { expected: 1, actual: 0 }.kind(),
            ErrorKind::StaleOrdering
        );
        assert_eq!(PoolError::Oversized { size: 2, max: 1 }.kind(), ErrorKind::Malformed);
        assert_eq!(
            PoolError::Rejected(TxRejection::BadSignature).kind(),
            ErrorKind::Malformed
        );
    }
}
