//! # lc-02-execution
//!
//! Account and transaction validation plus atomic application of a single
//! transaction against the state trie.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): validation predicates and `apply`
//! - **Ports Layer** (`ports/`): `TransactionExecutor`, the VM boundary
//! - **Adapters** (`adapters/`): `TransferExecutor` for plain transfers
//!
//! ## Rejections
//!
//! `apply` returns a typed [`TxRejection`] and leaves the input root
//! untouched; the caller simply keeps the previous root.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::TransferExecutor;
pub use domain::*;
pub use ports::*;
