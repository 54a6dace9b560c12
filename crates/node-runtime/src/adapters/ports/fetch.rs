//! Outbound port for fetching blocks from peers.

use async_trait::async_trait;
use shared_types::{Block, ErrorClass, ErrorKind, Hash};
use thiserror::Error;

/// Failure fetching a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The transport failed (peer gone, connection reset).
    #[error("Peer unreachable: {0}")]
    Unreachable(String),

    /// Every attempt failed or timed out.
    #[error("Block {} unavailable after {attempts} attempts", hex::encode(.hash))]
    Unavailable { hash: Hash, attempts: u32 },

    /// Too many unknown ancestors in a row.
    #[error("Gave up after fetching {depth} missing ancestors")]
    TooDeep { depth: usize },
}

impl ErrorClass for FetchError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Unavailable
    }
}

/// Retrieves a block by hash from whichever peer has it.
#[async_trait]
pub trait BlockFetcher: Send + Sync {
    /// `Ok(None)` when no peer has the block right now.
    async fn fetch_block(&self, hash: &Hash) -> Result<Option<Block>, FetchError>;
}
