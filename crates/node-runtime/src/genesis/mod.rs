//! # Genesis Module
//!
//! The genesis block has height 0, a zero parent hash, no transactions and a
//! state root committing to the configured allocations. It is finalized from
//! the start.

pub mod builder;

pub use builder::{GenesisBuilder, GenesisConfig, GenesisError};
