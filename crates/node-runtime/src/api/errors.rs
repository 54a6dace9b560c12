//! Errors surfaced by the ledger API.

use std::time::Duration;

use lc_01_state_trie::TrieError;
use lc_03_tx_pool::PoolError;
use lc_04_consensus::{ConsensusError, StoreError};
use lc_05_finality::FinalityError;
use lc_06_reorg::ReorgError;
use shared_types::{ErrorClass, ErrorKind};
use thiserror::Error;

use crate::adapters::FetchError;
use crate::genesis::GenesisError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Finality(#[from] FinalityError),

    #[error(transparent)]
    Reorg(#[from] ReorgError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    State(#[from] TrieError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Genesis(#[from] GenesisError),

    /// Another mutation held the writer past the deadline.
    #[error("Writer busy for more than {0:?}")]
    WriterBusy(Duration),
}

impl ErrorClass for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Pool(e) => e.kind(),
            LedgerError::Consensus(e) => e.kind(),
            LedgerError::Finality(e) => e.kind(),
            LedgerError::Reorg(e) => e.kind(),
            LedgerError::Store(e) => e.kind(),
            LedgerError::State(e) => e.kind(),
            LedgerError::Fetch(e) => e.kind(),
            LedgerError::Genesis(e) => e.kind(),
            LedgerError::WriterBusy(_) => ErrorKind::Unavailable,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
