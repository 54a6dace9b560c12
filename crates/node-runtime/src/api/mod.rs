//! # Ledger API
//!
//! The boundary consumed by wallets, dashboards and admin tools. Reads run
//! against the last committed head and never wait for the writer.

pub mod errors;
pub mod types;

use async_trait::async_trait;
use lc_01_state_trie::AccountProof;
use shared_bus::{EventFilter, Subscription};
use shared_types::{Address, BlockId, Hash, Receipt, SignedTransaction, StorageKey, U256};

pub use errors::{LedgerError, LedgerResult};
pub use types::{
    AccountView, BlockTransactions, BlockView, CommittedHead, ImportOutcome, SubmitOutcome,
};

#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Validates and pools a signed transaction.
    async fn submit_transaction(&self, tx: SignedTransaction) -> LedgerResult<SubmitOutcome>;

    /// Balance at the committed head; zero for unknown accounts.
    async fn get_balance(&self, address: &Address) -> LedgerResult<U256>;

    async fn get_account(&self, address: &Address) -> LedgerResult<AccountView>;

    /// A height resolves through the canonical chain; a hash finds any
    /// stored block.
    async fn get_block(
        &self,
        id: BlockId,
        include_transactions: bool,
    ) -> LedgerResult<Option<BlockView>>;

    /// Receipt of a transaction included in a canonical block.
    async fn get_transaction_receipt(&self, tx_hash: &Hash) -> LedgerResult<Option<Receipt>>;

    /// Proof of `address` (and optionally one storage slot) against the
    /// committed state root carried in the proof.
    async fn get_proof(
        &self,
        address: &Address,
        key: Option<StorageKey>,
    ) -> LedgerResult<AccountProof>;

    /// Events published after this call, in chain order.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}
