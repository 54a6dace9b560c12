//! # Ledger-Core Test Suite
//!
//! Cross-crate tests that drive a whole [`node_runtime::Ledger`].
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Funded ledgers, signed transfers, peer fetcher
//! └── integration/
//!     ├── scenario.rs   # Transfer, replay, finality, late fork
//!     ├── reorg.rs      # Fork choice, revert, returned transactions
//!     ├── finality.rs   # Permanence and rejected state roots
//!     ├── pool.rs       # Deterministic drain order
//!     ├── events.rs     # Subscription ordering and filters
//!     └── fetch.rs      # Missing ancestors, timeouts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lc-tests
//! cargo test -p lc-tests integration::reorg::
//! ```

pub mod fixtures;
pub mod integration;
