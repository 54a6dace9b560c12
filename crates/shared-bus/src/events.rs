//! # Ledger Events
//!
//! Typed events published by the ledger writer. Every event is emitted while
//! the writer lock is held, so each subscriber observes them in chain order.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Block, BlockHeader, ErrorKind, Hash, Log, Receipt, SignedTransaction};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // CHAIN HEAD
    // =========================================================================
    /// A block became part of the canonical chain.
    NewBlock {
        hash: Hash,
        header: BlockHeader,
        tx_hashes: Vec<Hash>,
    },

    /// The canonical chain switched branches. Followed by one `NewBlock`
    /// per applied block, oldest first.
    ChainReorganized {
        common_ancestor: Hash,
        /// Undone canonical blocks, newest first.
        reverted: Vec<Hash>,
        /// Winning branch, oldest first.
        applied: Vec<Hash>,
        new_tip: Hash,
    },

    /// A candidate block failed validation.
    BlockRejected {
        hash: Hash,
        kind: ErrorKind,
        reason: String,
    },

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================
    /// A transaction was admitted to the pool.
    NewPendingTransaction {
        hash: Hash,
        from: Address,
        nonce: u64,
    },

    /// A log emitted by a transaction in a newly canonical block.
    Log {
        log: Log,
        tx_hash: Hash,
        block_hash: Hash,
        block_height: u64,
        /// Position among the logs of the whole block.
        log_index: u32,
    },

    // =========================================================================
    // FINALITY
    // =========================================================================
    BlockFinalized { hash: Hash, height: u64 },

    BlockOrphaned { hash: Hash },
}

impl LedgerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::NewBlock { .. } | Self::ChainReorganized { .. } | Self::BlockRejected { .. } => {
                EventTopic::Chain
            }
            Self::NewPendingTransaction { .. } => EventTopic::PendingTransactions,
            Self::Log { .. } => EventTopic::Logs,
            Self::BlockFinalized { .. } | Self::BlockOrphaned { .. } => EventTopic::Finality,
        }
    }

    pub fn new_block(block: &Block) -> Self {
        Self::NewBlock {
            hash: block.hash(),
            header: block.header.clone(),
            tx_hashes: block.transactions.iter().map(SignedTransaction::hash).collect(),
        }
    }

    pub fn pending(tx: &SignedTransaction) -> Self {
        Self::NewPendingTransaction {
            hash: tx.hash(),
            from: tx.from,
            nonce: tx.nonce,
        }
    }

    /// One `Log` event per log in `receipts`, in receipt order.
    pub fn logs(receipts: &[Receipt]) -> Vec<Self> {
        receipts
            .iter()
            .flat_map(|r| r.logs.iter().map(move |log| (r, log)))
            .enumerate()
            .map(|(index, (receipt, log))| Self::Log {
                log: log.clone(),
                tx_hash: receipt.tx_hash,
                block_hash: receipt.block_hash,
                block_height: receipt.block_height,
                log_index: index as u32,
            })
            .collect()
    }

    /// Address the event concerns, if any.
    fn address(&self) -> Option<&Address> {
        match self {
            Self::NewPendingTransaction { from, .. } => Some(from),
            Self::Log { log, .. } => Some(&log.address),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// New blocks, reorganizations and rejected blocks.
    Chain,
    PendingTransactions,
    Logs,
    /// Finalized and orphaned blocks.
    Finality,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Only pending transactions from, and logs emitted by, these addresses.
    /// Events without an address always pass. Empty means any address.
    pub addresses: Vec<Address>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            addresses: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.addresses = addresses;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty() || self.topics.contains(&event.topic());

        let address_match = self.addresses.is_empty()
            || event
                .address()
                .map_or(true, |address| self.addresses.contains(address));

        topic_match && address_match
    }
}
