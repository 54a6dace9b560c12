use shared_types::{Address, ErrorClass, ErrorKind, Hash};
use thiserror::Error;

/// State trie errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrieError {
    /// A referenced node is not in the store (pruned or never synced).
    /// Distinct from a key that is simply absent.
    #[error("Missing trie node: {}", hex::encode(.0))]
    MissingNode(Hash),

    /// Stored bytes do not decode to a trie node.
    #[error("Corrupt trie node {}: {reason}", hex::encode(.hash))]
    CorruptNode { hash: Hash, reason: String },

    #[error("Empty values cannot be stored, delete the key instead")]
    EmptyValue,

    #[error("Key too long: {len} bytes (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("Value too large: {len} bytes (max {max})")]
    ValueTooLarge { len: usize, max: usize },

    #[error("Account {} is not a contract", hex::encode(.0))]
    NotAContract(Address),

    #[error("Encoding error: {0}")]
    Codec(String),

    #[error("Node store error: {0}")]
    Database(String),
}

impl ErrorClass for TrieError {
    fn kind(&self) -> ErrorKind {
        match self {
            TrieError::MissingNode(_) | TrieError::Database(_) => ErrorKind::Unavailable,
            TrieError::CorruptNode { .. } => ErrorKind::InvariantViolation,
            TrieError::EmptyValue
            | TrieError::KeyTooLong { .. }
            | TrieError::ValueTooLarge { .. }
            | TrieError::NotAContract(_)
            | TrieError::Codec(_) => ErrorKind::Malformed,
        }
    }
}

pub type TrieResult<T> = Result<T, TrieError>;
