//! # Domain Layer - Consensus
//!
//! - `stage`: per-candidate validation state machine
//! - `validator`: structural, transaction and state-root checks
//! - `builder`: block assembly for the local producer
//! - `block_size`: dynamic maximum block size
//! - `chain`: block tree, canonical index, fork choice
//! - `reward`, `genesis`: state transitions outside transactions

pub mod block_size;
pub mod builder;
pub mod chain;
pub mod config;
pub mod errors;
pub mod genesis;
pub mod reward;
pub mod stage;
pub mod validator;

pub use block_size::*;
pub use builder::*;
pub use chain::*;
pub use config::*;
pub use errors::*;
pub use genesis::*;
pub use reward::*;
pub use stage::*;
pub use validator::*;
