//! # Node Container
//!
//! Configuration and the [`Ledger`] that owns every subsystem instance.

pub mod config;
pub mod ledger;

pub use config::{ConfigError, NodeConfig, ProducerConfig};
pub use ledger::{Ledger, LedgerPorts};
