//! # Reorganization Manager
//!
//! Computes the switch from the canonical branch to a strictly better
//! competing branch:
//!
//! 1. Find the lowest common ancestor of both tips.
//! 2. Refuse if the ancestor lies below the last finalized block.
//! 3. Revert canonical blocks above the ancestor, newest first, through
//!    their undo journals. Each revert must land on the parent's state root.
//! 4. Replay the competing branch forward from the ancestor's root; every
//!    block must reproduce its declared state root.
//!
//! All of this reads and writes copy-on-write trie roots only. Nothing
//! canonical changes here: the caller commits the [`ReorgOutcome`] by moving
//! the canonical pointer. Any error leaves the chain exactly as it was.

use super::errors::{ReorgError, ReorgResult};
use lc_04_consensus::{BlockStore, BlockValidator, ChainEntry, ChainIndex};
use lc_05_finality::FinalityTracker;
use shared_types::{Block, Hash, Receipt, SignedTransaction};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// A replayed block of the winning branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayedBlock {
    pub block: Block,
    pub hash: Hash,
    pub receipts: Vec<Receipt>,
}

/// Everything the caller needs to commit a reorg.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorgOutcome {
    pub common_ancestor: ChainEntry,
    /// Canonical blocks undone, newest first.
    pub reverted: Vec<Hash>,
    /// Winning branch, oldest first.
    pub applied: Vec<ReplayedBlock>,
    /// Transactions from reverted blocks that the winning branch does not
    /// include, in their original order.
    pub returned_txs: Vec<SignedTransaction>,
    /// State root of the new tip.
    pub new_root: Hash,
}

impl ReorgOutcome {
    pub fn new_tip(&self) -> Hash {
        self.applied
            .last()
            .map_or(self.common_ancestor.hash, |b| b.hash)
    }

    pub fn depth(&self) -> usize {
        self.reverted.len()
    }
}

pub struct ReorgManager {
    store: Arc<dyn BlockStore>,
}

impl ReorgManager {
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        Self { store }
    }

    pub fn find_common_ancestor(
        &self,
        chain: &ChainIndex,
        canonical_tip: &Hash,
        competing_tip: &Hash,
    ) -> ReorgResult<ChainEntry> {
        chain
            .common_ancestor(canonical_tip, competing_tip)
            .and_then(|hash| chain.get(&hash).cloned())
            .ok_or(ReorgError::NoCommonAncestor {
                a: *canonical_tip,
                b: *competing_tip,
            })
    }

    /// Plans and verifies a switch to `competing_tip`.
    pub fn reorganize(
        &self,
        chain: &ChainIndex,
        validator: &BlockValidator,
        finality: &FinalityTracker,
        competing_tip: &Hash,
    ) -> ReorgResult<ReorgOutcome> {
        let canonical = chain.tip().clone();
        let competing = chain
            .get(competing_tip)
            .ok_or(ReorgError::UnknownBlock(*competing_tip))?;
        if competing.score() <= canonical.score() {
            return Err(ReorgError::NotBetter {
                candidate: competing.score(),
                canonical: canonical.score(),
            });
        }

        let ancestor = self.find_common_ancestor(chain, &canonical.hash, competing_tip)?;
        if let Err(e) = finality.guard_reorg(ancestor.height) {
            warn!(
                ancestor = %hex::encode(ancestor.hash),
                tip = %hex::encode(competing_tip),
                "reorg refused: crosses finality"
            );
            return Err(e.into());
        }

        let (reverted, reverted_txs) = self.revert(chain, validator, &canonical, &ancestor)?;
        let (applied, new_root) = self.replay(chain, validator, &ancestor, competing_tip)?;

        let included: HashSet<Hash> = applied
            .iter()
            .flat_map(|b| b.block.transactions.iter().map(SignedTransaction::hash))
            .collect();
        let returned_txs = reverted_txs
            .into_iter()
            .filter(|tx| !included.contains(&tx.hash()))
            .collect();

        let outcome = ReorgOutcome {
            common_ancestor: ancestor,
            reverted,
            applied,
            returned_txs,
            new_root,
        };
        info!(
            ancestor = %hex::encode(outcome.common_ancestor.hash),
            new_tip = %hex::encode(outcome.new_tip()),
            depth = outcome.depth(),
            applied = outcome.applied.len(),
            "chain reorganization prepared"
        );
        Ok(outcome)
    }

    /// Undoes canonical blocks from `tip` down to `ancestor`, exclusive.
    /// Returns their hashes newest first and their transactions oldest first.
    fn revert(
        &self,
        chain: &ChainIndex,
        validator: &BlockValidator,
        tip: &ChainEntry,
        ancestor: &ChainEntry,
    ) -> ReorgResult<(Vec<Hash>, Vec<SignedTransaction>)> {
        let trie = validator.state().trie();
        let path = chain
            .branch(&ancestor.hash, &tip.hash)
            .ok_or(ReorgError::UnknownBlock(tip.hash))?;

        let mut reverted = Vec::with_capacity(path.len());
        let mut blocks = Vec::with_capacity(path.len());
        let mut root = tip.state_root;

        for hash in path.iter().rev() {
            let entry = chain.get(hash).ok_or(ReorgError::UnknownBlock(*hash))?;
            let parent = chain
                .get(&entry.parent_hash)
                .ok_or(ReorgError::UnknownBlock(entry.parent_hash))?;
            let undo = self.store.undo(hash)?;

            let computed = trie.revert_changes(&root, &undo)?;
            if computed != parent.state_root {
                return Err(ReorgError::RevertMismatch {
                    block: *hash,
                    expected: parent.state_root,
                    computed,
                });
            }
            root = computed;

            let block = self
                .store
                .block(hash)?
                .ok_or(ReorgError::UnknownBlock(*hash))?;
            blocks.push(block);
            reverted.push(*hash);
        }

        let txs = blocks
            .into_iter()
            .rev()
            .flat_map(|b| b.transactions)
            .collect();
        Ok((reverted, txs))
    }

    /// Re-executes the competing branch from `ancestor` up to `tip`.
    fn replay(
        &self,
        chain: &ChainIndex,
        validator: &BlockValidator,
        ancestor: &ChainEntry,
        tip: &Hash,
    ) -> ReorgResult<(Vec<ReplayedBlock>, Hash)> {
        let path = chain
            .branch(&ancestor.hash, tip)
            .ok_or(ReorgError::UnknownBlock(*tip))?;

        let mut root = ancestor.state_root;
        let mut applied = Vec::with_capacity(path.len());
        for hash in path {
            let block = self
                .store
                .block(&hash)?
                .ok_or(ReorgError::UnknownBlock(hash))?;
            let receipts = validator
                .replay(&block, &root)
                .map_err(|source| ReorgError::Replay { block: hash, source })?;
            root = block.header.state_root;
            applied.push(ReplayedBlock {
                block,
                hash,
                receipts,
            });
        }
        Ok((applied, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_01_state_trie::{InMemoryTrieDb, StateDb};
    use lc_02_execution::TransferExecutor;
    use lc_04_consensus::{build_genesis, BlockBuilder, ConsensusConfig, InMemoryBlockStore};
    use lc_05_finality::FinalityConfig;
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{Account, Address, UnsignedTransaction, U256};

    const PRODUCER: Address = [0xFE; 20];
    const OTHER_PRODUCER: Address = [0xFD; 20];
    const BOB: Address = [0xB0; 20];

    struct Fixture {
        validator: BlockValidator,
        chain: ChainIndex,
        store: Arc<InMemoryBlockStore>,
        finality: FinalityTracker,
        manager: ReorgManager,
        alice: Secp256k1KeyPair,
    }

    fn fixture() -> Fixture {
        let state = StateDb::new(Arc::new(InMemoryTrieDb::new()));
        let alice = Secp256k1KeyPair::generate();
        let genesis = build_genesis(
            &state,
            &[Account::with_balance(alice.address(), U256::from(1000))],
            1_000,
        )
        .unwrap();
        let store = Arc::new(InMemoryBlockStore::new());
        store.put_block(&genesis, &[], &[]).unwrap();
        store.set_canonical(0, &[genesis.hash()]).unwrap();

        Fixture {
            validator: BlockValidator::new(
                state,
                Arc::new(TransferExecutor),
                ConsensusConfig::for_testing(),
            ),
            chain: ChainIndex::with_genesis(&genesis).unwrap(),
            finality: FinalityTracker::new(FinalityConfig::for_testing(), genesis.hash()),
            manager: ReorgManager::new(store.clone()),
            store,
            alice,
        }
    }

    fn send(f: &Fixture, nonce: u64, value: u64) -> SignedTransaction {
        UnsignedTransaction {
            from: f.alice.address(),
            to: BOB,
            value: U256::from(value),
            nonce,
            fee: U256::from(1),
            data: vec![],
        }
        .sign(&f.alice)
        .unwrap()
    }

    /// Builds, validates and stores a child of `parent` without moving the tip.
    fn extend(
        f: &mut Fixture,
        parent: Hash,
        producer: Address,
        txs: Vec<SignedTransaction>,
    ) -> Hash {
        let timestamp = f.chain.get(&parent).unwrap().timestamp + 10;
        let block = BlockBuilder::new(&f.validator)
            .build(&f.chain, &parent, producer, timestamp, txs)
            .unwrap()
            .block;
        let validated = f.validator.validate(block, &f.chain).unwrap();
        f.store
            .put_block(&validated.block, &validated.receipts, &validated.undo)
            .unwrap();
        f.chain.insert(validated.entry()).unwrap();
        f.finality.track(validated.hash);
        validated.hash
    }

    fn make_canonical(f: &mut Fixture, tip: Hash) {
        f.chain.set_canonical_tip(&tip).unwrap();
        f.finality.update(&f.chain).unwrap();
    }

    fn balance(f: &Fixture, root: &Hash, address: &Address) -> U256 {
        f.validator
            .state()
            .account_or_default(root, address)
            .unwrap()
            .balance
    }

    // =========================================================================
    // SWITCHING BRANCHES
    // =========================================================================

    #[test]
    fn test_longer_branch_replaces_canonical() {
        let mut f = fixture();
        let genesis = f.chain.genesis_hash();
        let tx = send(&f, 0, 100);
        let a1 = extend(&mut f, genesis, PRODUCER, vec![tx.clone()]);
        make_canonical(&mut f, a1);

        let b1 = extend(&mut f, genesis, OTHER_PRODUCER, vec![]);
        let b2 = extend(&mut f, b1, OTHER_PRODUCER, vec![]);

        let outcome = f
            .manager
            .reorganize(&f.chain, &f.validator, &f.finality, &b2)
            .unwrap();

        assert_eq!(outcome.common_ancestor.hash, genesis);
        assert_eq!(outcome.reverted, vec![a1]);
        assert_eq!(
            outcome.applied.iter().map(|b| b.hash).collect::<Vec<_>>(),
            vec![b1, b2]
        );
        assert_eq!(outcome.new_tip(), b2);
        assert_eq!(outcome.returned_txs, vec![tx]);
        assert_eq!(outcome.new_root, f.chain.get(&b2).unwrap().state_root);

        // Alice's transfer is undone on the winning branch.
        assert_eq!(
            balance(&f, &outcome.new_root, &f.alice.address()),
            U256::from(1000)
        );
        assert_eq!(balance(&f, &outcome.new_root, &BOB), U256::zero());
    }

    #[test]
    fn test_transactions_on_both_branches_are_not_returned() {
        let mut f = fixture();
        let genesis = f.chain.genesis_hash();
        let shared = send(&f, 0, 100);
        let a1 = extend(&mut f, genesis, PRODUCER, vec![shared.clone()]);
        make_canonical(&mut f, a1);

        let b1 = extend(&mut f, genesis, OTHER_PRODUCER, vec![shared]);
        let tx = send(&f, 1, 5);
        let b2 = extend(&mut f, b1, OTHER_PRODUCER, vec![tx]);

        let outcome = f
            .manager
            .reorganize(&f.chain, &f.validator, &f.finality, &b2)
            .unwrap();
        assert!(outcome.returned_txs.is_empty());
        assert_eq!(outcome.applied[1].receipts.len(), 1);
        assert_eq!(
            balance(&f, &outcome.new_root, &BOB),
            U256::from(105)
        );
    }

    #[test]
    fn test_extension_of_tip_reverts_nothing() {
        let mut f = fixture();
        let genesis = f.chain.genesis_hash();
        let a1 = extend(&mut f, genesis, PRODUCER, vec![]);
        make_canonical(&mut f, a1);
        let a2 = extend(&mut f, a1, PRODUCER, vec![]);

        let outcome = f
            .manager
            .reorganize(&f.chain, &f.validator, &f.finality, &a2)
            .unwrap();
        assert_eq!(outcome.common_ancestor.hash, a1);
        assert_eq!(outcome.depth(), 0);
        assert_eq!(outcome.new_tip(), a2);
    }

    // =========================================================================
    // REFUSALS
    // =========================================================================

    #[test]
    fn test_equal_length_branch_is_not_better() {
        let mut f = fixture();
        let genesis = f.chain.genesis_hash();
        let a1 = extend(&mut f, genesis, PRODUCER, vec![]);
        make_canonical(&mut f, a1);
        let b1 = extend(&mut f, genesis, OTHER_PRODUCER, vec![]);

        assert!(matches!(
            f.manager.reorganize(&f.chain, &f.validator, &f.finality, &b1),
            Err(ReorgError::NotBetter { candidate: 2, canonical: 2 })
        ));
    }

    #[test]
    fn test_reorg_across_finalized_block_is_refused() {
        let mut f = fixture();
        let genesis = f.chain.genesis_hash();

        // Threshold 2: a1 finalizes once a3 is canonical.
        let a1 = extend(&mut f, genesis, PRODUCER, vec![]);
        let a2 = extend(&mut f, a1, PRODUCER, vec![]);
        let a3 = extend(&mut f, a2, PRODUCER, vec![]);
        make_canonical(&mut f, a3);
        assert!(f.finality.is_finalized(&f.chain, &a1));

        let mut fork = genesis;
        for _ in 0..4 {
            fork = extend(&mut f, fork, OTHER_PRODUCER, vec![]);
        }

        let result = f.manager.reorganize(&f.chain, &f.validator, &f.finality, &fork);
        assert!(matches!(result, Err(ReorgError::Finality(_))));
        assert_eq!(f.chain.tip().hash, a3);
    }

    #[test]
    fn test_unknown_competing_tip() {
        let f = fixture();
        assert_eq!(
            f.manager
                .reorganize(&f.chain, &f.validator, &f.finality, &[0x77; 32])
                .unwrap_err()
                .to_string(),
            ReorgError::UnknownBlock([0x77; 32]).to_string()
        );
    }

    #[test]
    fn test_missing_undo_journal_aborts() {
        let mut f = fixture();
        let genesis = f.chain.genesis_hash();

        // Canonical block known to the index but never stored.
        let block = BlockBuilder::new(&f.validator)
            .build(&f.chain, &genesis, PRODUCER, 2_000, vec![])
            .unwrap()
            .block;
        let validated = f.validator.validate(block, &f.chain).unwrap();
        f.chain.insert(validated.entry()).unwrap();
        make_canonical(&mut f, validated.hash);

        let b1 = extend(&mut f, genesis, OTHER_PRODUCER, vec![]);
        let b2 = extend(&mut f, b1, OTHER_PRODUCER, vec![]);

        assert!(matches!(
            f.manager.reorganize(&f.chain, &f.validator, &f.finality, &b2),
            Err(ReorgError::Store(_))
        ));
        assert_eq!(f.chain.tip().hash, validated.hash);
    }
}
