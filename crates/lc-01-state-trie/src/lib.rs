//! # lc-01-state-trie
//!
//! Merkle Patricia state trie for Ledger-Core.
//!
//! ## Role in System
//!
//! - **Single Source of Truth**: account balances, nonces and contract
//!   storage, committed under a 32-byte state root
//! - **Copy-on-Write**: every write yields a new root; earlier roots stay
//!   readable, which is what block revert and reorg rely on
//! - **Proofs**: inclusion and exclusion proofs verifiable against a root
//!
//! ## Layout
//!
//! ```text
//! domain/   nibbles, rlp, node codec, trie algorithms, account state view
//! ports/    TrieDatabase (content-addressed node store)
//! adapters/ InMemoryTrieDb
//! ```
//!
//! A lookup that reaches a node absent from the store fails with
//! [`TrieError::MissingNode`]; that is never reported as an absent key.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
