//! # Transaction Pool
//!
//! Holds signed transactions awaiting inclusion, keyed by sender and nonce.
//!
//! ## Ready vs Queued
//!
//! | State | Meaning |
//! |-------|---------|
//! | Ready | nonce is contiguous with the sender's on-chain nonce |
//! | Queued | a lower nonce is missing; held until it arrives |
//!
//! Only ready transactions are selected for blocks. Selection
//! ([`TransactionPool::drain_for_block`]) orders by fee, breaking ties with
//! the parent block hash as a seed, and never removes anything: inclusion
//! removes.
//!
//! ## Concurrency
//!
//! [`PoolService`] serializes submissions per sender with [`SenderGuards`]
//! and relays accepted transactions through [`GossipRelay`].

pub mod domain;
pub mod gossip;
pub mod ports;
pub mod service;

pub use domain::*;
pub use gossip::{GossipConfig, GossipRelay};
pub use ports::*;
pub use service::PoolService;
