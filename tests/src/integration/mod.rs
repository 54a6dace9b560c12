//! End-to-end flows through the ledger API.

pub mod events;
pub mod fetch;
pub mod finality;
pub mod pool;
pub mod reorg;
pub mod scenario;
