//! # Node Runtime
//!
//! Wires the state trie, execution, pool, consensus, finality and reorg
//! crates into a single-node ledger and exposes the [`LedgerApi`].
//!
//! The binary in `main.rs` runs a producer loop over the same [`Ledger`].

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod api;
pub mod container;
pub mod genesis;

pub use api::{LedgerApi, LedgerError, LedgerResult};
pub use container::{ConfigError, Ledger, LedgerPorts, NodeConfig, ProducerConfig};
pub use genesis::{GenesisBuilder, GenesisConfig, GenesisError};
