//! Ports layer for the consensus engine.

pub mod store;

pub use store::*;
