//! # Transaction Rejections
//!
//! Typed reasons a transaction cannot be applied. A rejection never leaves
//! a partial state change behind.

use lc_01_state_trie::TrieError;
use shared_types::{Address, ErrorClass, ErrorKind, U256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxRejection {
    /// The primary signature does not recover to an address.
    #[error("Bad signature")]
    BadSignature,

    /// Signatures are valid but do not authorise the sender account.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Contract accounts can receive but never send.
    #[error("Contract account {} cannot send transactions", hex::encode(.0))]
    ContractSender(Address),

    #[error("Bad nonce: expected {expected}, got {actual}")]
    BadNonce { expected: u64, actual: u64 },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: U256, available: U256 },

    /// Crediting the recipient would overflow its balance.
    #[error("Recipient balance overflow")]
    BalanceOverflow,

    #[error("State error: {0}")]
    State(#[from] TrieError),
}

impl ErrorClass for TxRejection {
    fn kind(&self) -> ErrorKind {
        match self {
            TxRejection::BadSignature
            | TxRejection::Unauthorized(_)
            | TxRejection::ContractSender(_)
            | TxRejection::BalanceOverflow => ErrorKind::Malformed,
            TxRejection::BadNonce { .. } | TxRejection::InsufficientFunds { .. } => {
                ErrorKind::StaleOrdering
            }
            TxRejection::State(e) => e.kind(),
        }
    }
}

/// Failure reported by a transaction executor. The transaction still pays
/// its fee and consumes its nonce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("Storage write rejected: {0}")]
    StorageWrite(String),
}
