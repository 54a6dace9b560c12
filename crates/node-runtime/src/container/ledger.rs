//! # Ledger
//!
//! The single node. One writer mutates the chain; everything else reads.
//!
//! ```text
//!  submit / gossip ──► PoolService ──(drain)──┐
//!                                             ▼
//!  import / produce ──► Writer ─ validator ─ chain index ─ finality ─ reorg
//!                         │
//!                         ├──► BlockStore (bodies, receipts, undo, canonical index)
//!                         ├──► CommittedHead swap
//!                         └──► events, published before the writer is released
//! ```
//!
//! ## Writer discipline
//!
//! Every chain mutation takes the writer lock with a deadline, does its work
//! on copy-on-write roots, and swaps the committed head last. Readers load the
//! head once and then read the immutable trie nodes under it, so they never
//! observe a half-applied block. The writer is never held across an `.await`.

use std::sync::Arc;

use async_trait::async_trait;
use lc_01_state_trie::{AccountProof, InMemoryTrieDb, PatriciaMerkleTrie, StateDb, TrieDatabase};
use lc_02_execution::{TransactionExecutor, TransferExecutor};
use lc_03_tx_pool::{GossipRelay, GossipTransport, PeerId, PoolService, SystemTimeSource};
use lc_04_consensus::{
    BlockBuilder, BlockStore, BlockValidator, BuiltBlock, ChainIndex, ConsensusError,
    InMemoryBlockStore, ValidatedBlock,
};
use lc_05_finality::FinalityTracker;
use lc_06_reorg::{ReorgManager, ReorgOutcome};
use parking_lot::{Mutex, MutexGuard, RwLock};
use shared_bus::{
    EventFilter, EventPublisher, EventStream, InMemoryEventBus, LedgerEvent, Subscription,
};
use shared_types::{
    AccountKind, Address, Block, BlockId, ErrorClass, ErrorKind, FinalityStatus, Hash, Receipt,
    SignedTransaction, StorageKey, U256,
};
use tracing::{debug, error, info};

use crate::adapters::{BlockFetcher, FetchError, HeadAccountSource, RetryingFetcher};
use crate::api::{
    AccountView, BlockTransactions, BlockView, CommittedHead, ImportOutcome, LedgerApi,
    LedgerError, LedgerResult, SubmitOutcome,
};
use crate::container::config::NodeConfig;
use crate::genesis::GenesisBuilder;

/// External collaborators. The defaults are in-memory stores, the
/// transfer-only executor and no peers.
pub struct LedgerPorts {
    pub executor: Arc<dyn TransactionExecutor>,
    pub trie_db: Arc<dyn TrieDatabase>,
    pub store: Arc<dyn BlockStore>,
    pub gossip: Option<Arc<dyn GossipTransport>>,
    pub fetcher: Option<Arc<dyn BlockFetcher>>,
}

impl Default for LedgerPorts {
    fn default() -> Self {
        Self {
            executor: Arc::new(TransferExecutor),
            trie_db: Arc::new(InMemoryTrieDb::new()),
            store: Arc::new(InMemoryBlockStore::new()),
            gossip: None,
            fetcher: None,
        }
    }
}

/// State owned by the single writer.
struct Writer {
    chain: ChainIndex,
    validator: BlockValidator,
    finality: FinalityTracker,
    reorg: ReorgManager,
}

pub struct Ledger {
    config: NodeConfig,
    writer: Mutex<Writer>,
    head: Arc<RwLock<CommittedHead>>,
    state: StateDb,
    store: Arc<dyn BlockStore>,
    pool: PoolService,
    events: InMemoryEventBus,
    fetcher: Option<RetryingFetcher>,
}

impl Ledger {
    /// In-memory ledger with the transfer-only executor and no peers.
    pub fn new(config: NodeConfig) -> LedgerResult<Self> {
        Self::with_ports(config, LedgerPorts::default())
    }

    /// Builds genesis from `config.genesis` and wires the subsystems.
    pub fn with_ports(config: NodeConfig, ports: LedgerPorts) -> LedgerResult<Self> {
        let state = StateDb::from_trie(PatriciaMerkleTrie::with_config(
            ports.trie_db,
            config.trie.clone(),
        ));
        let genesis = GenesisBuilder::new(config.genesis.clone()).build(&state)?;
        let genesis_hash = genesis.hash();

        let store = ports.store;
        store.put_block(&genesis, &[], &[])?;
        store.set_canonical(0, &[genesis_hash])?;
        store.set_finality(&genesis_hash, FinalityStatus::Finalized)?;

        let head = Arc::new(RwLock::new(CommittedHead {
            hash: genesis_hash,
            height: 0,
            timestamp: genesis.header.timestamp,
            state_root: genesis.header.state_root,
        }));

        let accounts = Arc::new(HeadAccountSource::new(state.clone(), Arc::clone(&head)));
        let mut pool = PoolService::new(config.pool.clone(), accounts, Arc::new(SystemTimeSource));
        if let Some(transport) = ports.gossip {
            pool = pool.with_gossip(Arc::new(GossipRelay::new(transport, config.gossip.clone())));
        }

        let writer = Writer {
            chain: ChainIndex::with_genesis(&genesis)?,
            validator: BlockValidator::new(
                state.clone(),
                ports.executor,
                config.consensus.clone(),
            ),
            finality: FinalityTracker::new(config.finality.clone(), genesis_hash),
            reorg: ReorgManager::new(Arc::clone(&store)),
        };

        info!(
            genesis = %hex::encode(genesis_hash),
            confirmations = config.finality.confirmation_threshold,
            "ledger initialized"
        );

        Ok(Self {
            writer: Mutex::new(writer),
            head,
            state,
            store,
            pool,
            events: InMemoryEventBus::with_capacity(config.event_capacity),
            fetcher: ports
                .fetcher
                .map(|inner| RetryingFetcher::new(inner, config.fetch.clone())),
            config,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn head(&self) -> CommittedHead {
        *self.head.read()
    }

    pub fn finality_status(&self, hash: &Hash) -> LedgerResult<Option<FinalityStatus>> {
        Ok(self.store.finality(hash)?)
    }

    pub fn pool(&self) -> &PoolService {
        &self.pool
    }

    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.events.event_stream(filter)
    }

    // =========================================================================
    // TRANSACTION INGESTION
    // =========================================================================

    /// Handles a transaction relayed by `peer`.
    pub async fn receive_gossip(
        &self,
        peer: PeerId,
        tx: SignedTransaction,
    ) -> LedgerResult<SubmitOutcome> {
        let pending = LedgerEvent::pending(&tx);
        let hash = tx.hash();
        let placement = self.pool.receive_gossip(peer, tx).await?;
        self.events.publish(pending);
        Ok(SubmitOutcome { hash, placement })
    }

    // =========================================================================
    // CHAIN MUTATION
    // =========================================================================

    /// Validates and stores `block`, moving the canonical chain if its
    /// branch is now the best.
    pub fn import_block(&self, block: Block) -> LedgerResult<ImportOutcome> {
        let mut writer = self.lock_writer()?;
        self.import_locked(&mut writer, block)
    }

    /// Like [`Ledger::import_block`], but fetches unknown ancestors first.
    /// Fetches run without the writer held and give up as unavailable.
    pub async fn import_block_with_fetch(&self, block: Block) -> LedgerResult<ImportOutcome> {
        let mut pending: Vec<Block> = Vec::new();
        let mut current = block;

        loop {
            let parent = current.parent_hash();
            if !current.header.is_genesis() && !self.store.contains(&parent)? {
                let Some(fetcher) = &self.fetcher else {
                    return Err(ConsensusError::UnknownParent(parent).into());
                };
                if pending.len() >= fetcher.config().max_depth {
                    return Err(FetchError::TooDeep {
                        depth: pending.len(),
                    }
                    .into());
                }
                let fetched = fetcher.fetch(&parent).await?;
                pending.push(std::mem::replace(&mut current, fetched));
                continue;
            }

            let outcome = self.import_block(current)?;
            match pending.pop() {
                Some(next) => current = next,
                None => return Ok(outcome),
            }
        }
    }

    /// Builds a block on the canonical tip from the pool and imports it.
    pub fn produce_block(&self, producer: Address, timestamp: u64) -> LedgerResult<Block> {
        let mut writer = self.lock_writer()?;
        let w = &mut *writer;

        let tip = w.chain.tip().clone();
        let limit = w.validator.max_block_size(&w.chain, &tip.hash)?;
        let candidates = self.pool.drain_for_block(limit, &tip.hash);
        let built = BlockBuilder::new(&w.validator).build(
            &w.chain,
            &tip.hash,
            producer,
            timestamp,
            candidates,
        )?;

        for (hash, reason) in &built.rejected {
            if reason.kind() == ErrorKind::Malformed {
                // Never valid against any state.
                if let Err(e) = self.pool.remove(hash) {
                    debug!(tx = %hex::encode(hash), error = %e, "rejected transaction already gone");
                }
            }
            debug!(tx = %hex::encode(hash), reason = %reason, "left out of block");
        }

        let block = built.block;
        self.import_locked(w, block.clone())?;
        Ok(block)
    }

    /// Builds, without importing, a block on any known `parent`.
    pub fn build_block(
        &self,
        parent: &Hash,
        producer: Address,
        timestamp: u64,
        candidates: Vec<SignedTransaction>,
    ) -> LedgerResult<BuiltBlock> {
        let writer = self.lock_writer()?;
        Ok(BlockBuilder::new(&writer.validator).build(
            &writer.chain,
            parent,
            producer,
            timestamp,
            candidates,
        )?)
    }

    fn lock_writer(&self) -> LedgerResult<MutexGuard<'_, Writer>> {
        self.writer
            .try_lock_for(self.config.writer_timeout)
            .ok_or(LedgerError::WriterBusy(self.config.writer_timeout))
    }

    fn import_locked(&self, w: &mut Writer, block: Block) -> LedgerResult<ImportOutcome> {
        let hash = block.hash();

        if let Err(e) = self.guard_finality(w, &block) {
            error!(
                block = %hex::encode(hash),
                height = block.height(),
                error = %e,
                "block forks below the last finalized block"
            );
            self.publish_rejected(hash, &e);
            return Err(e);
        }

        let validated = match w.validator.validate(block, &w.chain) {
            Ok(validated) => validated,
            Err(e) => {
                if e.is_permanent() {
                    self.publish_rejected(hash, &e);
                }
                return Err(e.into());
            }
        };

        self.store
            .put_block(&validated.block, &validated.receipts, &validated.undo)?;
        w.chain.insert(validated.entry())?;
        w.finality.track(hash);
        self.store.set_finality(&hash, FinalityStatus::Pending)?;

        if !w.chain.is_better_than_tip(&hash) {
            debug!(
                block = %hex::encode(hash),
                height = validated.block.height(),
                "stored side-branch block"
            );
            return Ok(ImportOutcome::SideBranch { hash });
        }

        let outcome = if validated.block.parent_hash() == w.chain.tip().hash {
            self.commit_extension(w, &validated)?;
            ImportOutcome::Extended {
                hash,
                height: validated.block.height(),
            }
        } else {
            let reorg = w
                .reorg
                .reorganize(&w.chain, &w.validator, &w.finality, &hash)?;
            let outcome = ImportOutcome::Reorganized {
                hash,
                common_ancestor: reorg.common_ancestor.hash,
                depth: reorg.depth(),
            };
            self.commit_reorg(w, reorg)?;
            outcome
        };

        self.advance_finality(w)?;
        Ok(outcome)
    }

    /// A block whose parent does not descend from the last finalized block
    /// could only become canonical by reverting finalized history.
    fn guard_finality(&self, w: &Writer, block: &Block) -> LedgerResult<()> {
        let parent = block.parent_hash();
        if !w.chain.contains(&parent) {
            return Ok(());
        }
        let barrier = w.finality.last_finalized();
        if w.chain.is_ancestor(&barrier.hash, &parent) {
            return Ok(());
        }
        let ancestor_height = w
            .chain
            .common_ancestor(&barrier.hash, &parent)
            .and_then(|ancestor| w.chain.get(&ancestor))
            .map_or(0, |entry| entry.height);
        w.finality.guard_reorg(ancestor_height)?;
        Ok(())
    }

    fn commit_extension(&self, w: &mut Writer, validated: &ValidatedBlock) -> LedgerResult<()> {
        let block = &validated.block;
        w.chain.set_canonical_tip(&validated.hash)?;
        self.store.set_canonical(block.height(), &[validated.hash])?;
        self.swap_head(block);

        self.publish_block(block, &validated.receipts);
        self.pool.on_block_committed(&block.transactions);

        info!(
            block = %hex::encode(validated.hash),
            height = block.height(),
            txs = block.transactions.len(),
            "block imported"
        );
        Ok(())
    }

    fn commit_reorg(&self, w: &mut Writer, outcome: ReorgOutcome) -> LedgerResult<()> {
        let new_tip = outcome.new_tip();
        let applied: Vec<Hash> = outcome.applied.iter().map(|b| b.hash).collect();

        w.chain.set_canonical_tip(&new_tip)?;
        self.store
            .set_canonical(outcome.common_ancestor.height + 1, &applied)?;
        if let Some(last) = outcome.applied.last() {
            self.swap_head(&last.block);
        }

        self.events.publish(LedgerEvent::ChainReorganized {
            common_ancestor: outcome.common_ancestor.hash,
            reverted: outcome.reverted.clone(),
            applied,
            new_tip,
        });
        for replayed in &outcome.applied {
            self.publish_block(&replayed.block, &replayed.receipts);
        }

        let applied_txs: Vec<SignedTransaction> = outcome
            .applied
            .iter()
            .flat_map(|b| b.block.transactions.iter().cloned())
            .collect();
        let returned = outcome.returned_txs.len();
        self.pool.on_reorg(outcome.returned_txs, &applied_txs);

        info!(
            new_tip = %hex::encode(new_tip),
            ancestor = %hex::encode(outcome.common_ancestor.hash),
            depth = outcome.reverted.len(),
            returned,
            "chain reorganized"
        );
        Ok(())
    }

    fn advance_finality(&self, w: &mut Writer) -> LedgerResult<()> {
        let changes = w.finality.update(&w.chain)?;
        for checkpoint in changes.finalized {
            self.store
                .set_finality(&checkpoint.hash, FinalityStatus::Finalized)?;
            self.events.publish(LedgerEvent::BlockFinalized {
                hash: checkpoint.hash,
                height: checkpoint.height,
            });
        }
        for hash in changes.orphaned {
            self.store.set_finality(&hash, FinalityStatus::Orphaned)?;
            self.events.publish(LedgerEvent::BlockOrphaned { hash });
        }
        Ok(())
    }

    fn swap_head(&self, block: &Block) {
        *self.head.write() = CommittedHead {
            hash: block.hash(),
            height: block.height(),
            timestamp: block.header.timestamp,
            state_root: block.header.state_root,
        };
    }

    fn publish_block(&self, block: &Block, receipts: &[Receipt]) {
        self.events.publish(LedgerEvent::new_block(block));
        for event in LedgerEvent::logs(receipts) {
            self.events.publish(event);
        }
    }

    fn publish_rejected<E: ErrorClass + std::fmt::Display>(&self, hash: Hash, error: &E) {
        self.events.publish(LedgerEvent::BlockRejected {
            hash,
            kind: error.kind(),
            reason: error.to_string(),
        });
    }

    fn committed_root(&self) -> Hash {
        self.head.read().state_root
    }

    fn block_view(&self, block: Block, include_transactions: bool) -> LedgerResult<BlockView> {
        let hash = block.hash();
        let canonical = self.store.canonical_hash(block.height())? == Some(hash);
        let finality = self
            .store
            .finality(&hash)?
            .unwrap_or(FinalityStatus::Pending);
        let transactions = if include_transactions {
            BlockTransactions::Full(block.transactions.clone())
        } else {
            BlockTransactions::Hashes(block.transactions.iter().map(|tx| tx.hash()).collect())
        };
        Ok(BlockView {
            hash,
            size: block.size_bytes(),
            total_fees: block.total_fees(),
            header: block.header,
            canonical,
            finality,
            transactions,
        })
    }
}

#[async_trait]
impl LedgerApi for Ledger {
    async fn submit_transaction(&self, tx: SignedTransaction) -> LedgerResult<SubmitOutcome> {
        let pending = LedgerEvent::pending(&tx);
        let hash = tx.hash();
        let placement = match self.pool.submit(tx).await {
            Ok(placement) => placement,
            Err(e) => {
                debug!(tx = %hex::encode(hash), error = %e, "submission rejected");
                return Err(e.into());
            }
        };
        self.events.publish(pending);
        Ok(SubmitOutcome { hash, placement })
    }

    async fn get_balance(&self, address: &Address) -> LedgerResult<U256> {
        let root = self.committed_root();
        Ok(self.state.account_or_default(&root, address)?.balance)
    }

    async fn get_account(&self, address: &Address) -> LedgerResult<AccountView> {
        let root = self.committed_root();
        let account = self.state.account_or_default(&root, address)?;
        let code_hash = match account.kind {
            AccountKind::Contract { code_hash, .. } => Some(code_hash),
            _ => None,
        };
        Ok(AccountView {
            address: account.address,
            balance: account.balance,
            nonce: account.nonce,
            code_hash,
        })
    }

    async fn get_block(
        &self,
        id: BlockId,
        include_transactions: bool,
    ) -> LedgerResult<Option<BlockView>> {
        let hash = match id {
            BlockId::Hash(hash) => Some(hash),
            BlockId::Height(height) => self.store.canonical_hash(height)?,
        };
        let Some(hash) = hash else {
            return Ok(None);
        };
        match self.store.block(&hash)? {
            Some(block) => Ok(Some(self.block_view(block, include_transactions)?)),
            None => Ok(None),
        }
    }

    async fn get_transaction_receipt(&self, tx_hash: &Hash) -> LedgerResult<Option<Receipt>> {
        for block_hash in self.store.blocks_containing(tx_hash)? {
            let Some(block) = self.store.block(&block_hash)? else {
                continue;
            };
            if self.store.canonical_hash(block.height())? != Some(block_hash) {
                continue;
            }
            let receipt = self
                .store
                .receipts(&block_hash)?
                .into_iter()
                .find(|r| &r.tx_hash == tx_hash);
            if receipt.is_some() {
                return Ok(receipt);
            }
        }
        Ok(None)
    }

    async fn get_proof(
        &self,
        address: &Address,
        key: Option<StorageKey>,
    ) -> LedgerResult<AccountProof> {
        let root = self.committed_root();
        Ok(self.state.account_proof(&root, address, key.as_ref())?)
    }

    fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.events.subscribe(filter)
    }
}
