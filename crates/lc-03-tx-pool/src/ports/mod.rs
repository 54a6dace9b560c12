//! Ports layer for the transaction pool.

pub mod outbound;

pub use outbound::*;
