//! Outbound ports owned by the runtime.

pub mod fetch;

pub use fetch::{BlockFetcher, FetchError};
