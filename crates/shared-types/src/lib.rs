//! # Shared Types Crate
//!
//! Domain entities shared by every Ledger-Core crate: accounts, signed
//! transactions, receipts, blocks, and the error taxonomy.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here only.
//! - **Content Addressing**: blocks and transactions are identified by the
//!   Keccak-256 hash of their canonical fields.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
