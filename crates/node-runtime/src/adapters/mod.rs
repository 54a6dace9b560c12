//! # Adapters
//!
//! Port implementations connecting the subsystem crates to the ledger.

pub mod accounts;
pub mod fetcher;
pub mod ports;

pub use accounts::HeadAccountSource;
pub use fetcher::{FetchConfig, RetryingFetcher};
pub use ports::{BlockFetcher, FetchError};
