//! # Domain Layer - Transaction Pool
//!
//! - `entities`: PooledTransaction, PoolConfig, Placement, PoolStatus
//! - `pool`: TransactionPool with fee and per-sender nonce indices
//! - `value_objects`: eviction and block-selection ordering keys
//! - `guards`: per-sender admission locks
//! - `errors`: PoolError enumeration

pub mod entities;
pub mod errors;
pub mod guards;
pub mod pool;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use guards::*;
pub use pool::*;
pub use value_objects::*;
