//! # Error Taxonomy
//!
//! Every crate keeps its own error enum; all of them classify into one of
//! the categories below so callers can decide whether to resubmit, retry or
//! drop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse error category shared across crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad signature, bad encoding, oversized block. Never retried.
    Malformed,
    /// Wrong nonce, duplicate, stale reorg target. Caller may resubmit.
    StaleOrdering,
    /// Missing trie node or unreachable peer. Retried with backoff.
    Unavailable,
    /// State root mismatch or reorg across finality. Fatal for the candidate.
    InvariantViolation,
    /// Lookup target does not exist.
    NotFound,
}

impl ErrorKind {
    /// Whether a networking collaborator may retry automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Unavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Malformed => "malformed",
            ErrorKind::StaleOrdering => "stale",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::InvariantViolation => "invariant-violation",
            ErrorKind::NotFound => "not-found",
        };
        f.write_str(label)
    }
}

/// Implemented by every crate error to expose its category.
pub trait ErrorClass {
    fn kind(&self) -> ErrorKind;
}
