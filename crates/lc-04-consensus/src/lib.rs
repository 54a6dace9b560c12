//! # Consensus Engine
//!
//! Decides whether a block may join the chain and where the canonical tip
//! is.
//!
//! ## Validation Stages
//!
//! ```text
//! Received -> StructurallyValid -> TransactionsValid -> Applied
//!                                                     (any) -> Rejected
//! ```
//!
//! | Stage | Checks |
//! |-------|--------|
//! | Structural | parent known, height, timestamp, transactions root, dynamic size limit |
//! | Transactions | signatures in parallel, then sequential application from the parent root |
//! | Applied | reward credited, state root equals the header's |
//!
//! ## Fork Choice
//!
//! Score is chain length. [`ChainIndex`] keeps every validated block and the
//! canonical height index; a competing branch replaces the canonical one only
//! when strictly longer.
//!
//! ## Storage
//!
//! [`BlockStore`] persists bodies, receipts, undo journals, the canonical
//! index and finality statuses. [`InMemoryBlockStore`] is the bundled
//! adapter.

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use adapters::InMemoryBlockStore;
pub use domain::*;
pub use ports::*;
