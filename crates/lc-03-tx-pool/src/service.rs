//! # Pool Service
//!
//! Application service wrapping [`TransactionPool`] for concurrent use:
//! admission checks against the committed head, per-sender serialization,
//! and gossip of newly accepted transactions.

use crate::domain::{
    Hash, Placement, PoolConfig, PoolError, PoolStatus, SenderGuards, TransactionPool,
};
use crate::gossip::GossipRelay;
use crate::ports::{AccountSource, PeerId, TimeSource};
use lc_02_execution::{validate_authorization, validate_balance, TxRejection};
use parking_lot::RwLock;
use shared_types::{Address, SignedTransaction};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PoolService {
    pool: RwLock<TransactionPool>,
    guards: SenderGuards,
    accounts: Arc<dyn AccountSource>,
    clock: Arc<dyn TimeSource>,
    gossip: Option<Arc<GossipRelay>>,
}

impl PoolService {
    pub fn new(
        config: PoolConfig,
        accounts: Arc<dyn AccountSource>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            pool: RwLock::new(TransactionPool::new(config)),
            guards: SenderGuards::new(),
            accounts,
            clock,
            gossip: None,
        }
    }

    pub fn with_gossip(mut self, relay: Arc<GossipRelay>) -> Self {
        self.gossip = Some(relay);
        self
    }

    /// Validates `tx` against the committed head and pools it.
    ///
    /// The nonce may run ahead of the account (the transaction is queued),
    /// but signatures and the ability to pay are checked now.
    pub async fn submit(&self, tx: SignedTransaction) -> Result<Placement, PoolError> {
        let _guard = self.guards.lock(tx.from).await;
        let placement = self.admit(tx.clone())?;

        if let Some(relay) = &self.gossip {
            let relay = Arc::clone(relay);
            tokio::spawn(async move {
                relay.broadcast(&tx, None).await;
            });
        }
        Ok(placement)
    }

    /// Handles a transaction announced by `peer`. The peer is never sent the
    /// transaction back.
    pub async fn receive_gossip(
        &self,
        peer: PeerId,
        tx: SignedTransaction,
    ) -> Result<Placement, PoolError> {
        if let Some(relay) = &self.gossip {
            relay.mark_known(peer, tx.hash());
        }

        let _guard = self.guards.lock(tx.from).await;
        let placement = self.admit(tx.clone())?;

        if let Some(relay) = &self.gossip {
            let relay = Arc::clone(relay);
            tokio::spawn(async move {
                relay.broadcast(&tx, Some(peer)).await;
            });
        }
        Ok(placement)
    }

    fn admit(&self, tx: SignedTransaction) -> Result<Placement, PoolError> {
        let hash = tx.hash();
        let account = self.accounts.account(&tx.from)?;
        if let Err(rejection) = validate_authorization(&tx, &account) {
            warn!(tx = %hex::encode(hash), reason = %rejection, "transaction rejected");
            return Err(rejection.into());
        }

        // Nonce and balance are read under the pool lock, which block commits
        // also hold while advancing sender nonces.
        let mut pool = self.pool.write();
        let account = self.accounts.account(&tx.from)?;
        if !validate_balance(&tx, &account) {
            let rejection = TxRejection::InsufficientFunds {
                required: tx.total_cost().unwrap_or(shared_types::U256::MAX),
                available: account.balance,
            };
            warn!(tx = %hex::encode(hash), reason = %rejection, "transaction rejected");
            return Err(rejection.into());
        }

        let result = pool.submit(tx, account.nonce, self.clock.now());
        match &result {
            Ok(placement) => {
                debug!(tx = %hex::encode(hash), ?placement, "transaction accepted")
            }
            Err(e) => warn!(tx = %hex::encode(hash), error = %e, "transaction rejected"),
        }
        result
    }

    /// See [`TransactionPool::drain_for_block`].
    pub fn drain_for_block(&self, max_bytes: u64, seed: &Hash) -> Vec<SignedTransaction> {
        self.pool.read().drain_for_block(max_bytes, seed)
    }

    pub fn remove(&self, hash: &Hash) -> Result<(), PoolError> {
        self.pool.write().remove(hash).map(|_| ())
    }

    /// Drops a block's transactions and re-reads sender nonces from the new
    /// head.
    pub fn on_block_committed(&self, txs: &[SignedTransaction]) {
        let mut pool = self.pool.write();
        pool.remove_included(txs);
        let accounts = &self.accounts;
        pool.prune_stale(|address| accounts.account(address).ok().map(|a| a.nonce));
    }

    /// Returns reverted transactions after a reorg, then drops whatever the
    /// new canonical branch already consumed.
    pub fn on_reorg(&self, returned: Vec<SignedTransaction>, applied: &[SignedTransaction]) {
        let now = self.clock.now();
        let mut pool = self.pool.write();
        let accepted = pool.reinsert(returned, now);
        pool.remove_included(applied);
        let accounts = &self.accounts;
        pool.prune_stale(|address| accounts.account(address).ok().map(|a| a.nonce));
        debug!(accepted, "returned reorged transactions to pool");
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.pool.read().contains(hash)
    }

    pub fn next_nonce(&self, sender: &Address) -> Option<u64> {
        self.pool.read().next_nonce(sender)
    }

    pub fn status(&self) -> PoolStatus {
        self.pool.read().status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gossip::tests::RecordingTransport;
    use crate::gossip::GossipConfig;
    use shared_crypto::Secp256k1KeyPair;
    use shared_types::{Account, UnsignedTransaction, U256};
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Default)]
    struct Accounts(parking_lot::Mutex<HashMap<Address, Account>>);

    impl Accounts {
        fn set(&self, account: Account) {
            self.0.lock().insert(account.address, account);
        }
    }

    impl AccountSource for Accounts {
        fn account(&self, address: &Address) -> Result<Account, TxRejection> {
            Ok(self
                .0
                .lock()
                .get(address)
                .cloned()
                .unwrap_or_else(|| Account::new(*address)))
        }
    }

    struct FixedClock;

    impl TimeSource for FixedClock {
        fn now(&self) -> u64 {
            1_000
        }
    }

    fn transfer(key: &Secp256k1KeyPair, nonce: u64, value: u64) -> SignedTransaction {
        UnsignedTransaction {
            from: key.address(),
            to: [0xBB; 20],
            value: U256::from(value),
            nonce,
            fee: U256::from(1),
            data: vec![],
        }
        .sign(key)
        .unwrap()
    }

    fn service(accounts: Arc<Accounts>) -> PoolService {
        PoolService::new(PoolConfig::for_testing(), accounts, Arc::new(FixedClock))
    }

    // =========================================================================
    // ADMISSION
    // =========================================================================

    #[tokio::test]
    async fn test_submit_checks_against_head() {
        let accounts = Arc::new(Accounts::default());
        let alice = Secp256k1KeyPair::generate();
        accounts.set(Account::with_balance(alice.address(), U256::from(100)));
        let service = service(accounts.clone());

        assert_eq!(service.submit(transfer(&alice, 0, 10)).await, Ok(Placement::Ready));
        assert_eq!(service.submit(transfer(&alice, 2, 10)).await, Ok(Placement::Queued));
        assert!(matches!(
            service.submit(transfer(&alice, 1, 100)).await,
            Err(PoolError::Rejected(TxRejection::InsufficientFunds { .. }))
        ));

        let mut forged = transfer(&alice, 1, 1);
        forged.value = U256::from(2);
        assert!(matches!(
            service.submit(forged).await,
            Err(PoolError::Rejected(TxRejection::BadSignature))
        ));
    }

    #[tokio::test]
    async fn test_committed_block_prunes_pool() {
        let accounts = Arc::new(Accounts::default());
        let alice = Secp256k1KeyPair::generate();
        accounts.set(Account::with_balance(alice.address(), U256::from(100)));
        let service = service(accounts.clone());

        let t0 = transfer(&alice, 0, 10);
        let t1 = transfer(&alice, 1, 10);
        service.submit(t0.clone()).await.unwrap();
        service.submit(t1.clone()).await.unwrap();

        accounts.set(Account {
            nonce: 1,
            ..Account::with_balance(alice.address(), U256::from(89))
        });
        service.on_block_committed(&[t0.clone()]);
        assert!(!service.contains(&t0.hash()));
        assert!(service.contains(&t1.hash()));

        // Replay of an included transaction is now stale.
        assert!(matches!(
            service.submit(t0).await,
            Err(PoolError::StaleNonce { expected: 1, actual: 0 })
        ));
    }

    /// Reports `before` on the first read and `after` from then on.
    struct CommitDuringAdmission {
        before: Account,
        after: Account,
        reads: std::sync::atomic::AtomicUsize,
    }

    impl AccountSource for CommitDuringAdmission {
        fn account(&self, _: &Address) -> Result<Account, TxRejection> {
            let n = self
                .reads
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(if n == 0 {
                self.before.clone()
            } else {
                self.after.clone()
            })
        }
    }

    #[tokio::test]
    async fn test_nonce_is_read_under_pool_lock() {
        let alice = Secp256k1KeyPair::generate();
        let t0 = transfer(&alice, 0, 10);
        let accounts = Arc::new(CommitDuringAdmission {
            before: Account::with_balance(alice.address(), U256::from(100)),
            after: Account {
                nonce: 1,
                ..Account::with_balance(alice.address(), U256::from(89))
            },
            reads: Default::default(),
        });
        let service = PoolService::new(PoolConfig::for_testing(), accounts, Arc::new(FixedClock));

        assert_eq!(
            service.submit(t0.clone()).await,
            Err(PoolError::StaleNonce { expected: 1, actual: 0 })
        );
        assert!(!service.contains(&t0.hash()));
    }

    // =========================================================================
    // GOSSIP
    // =========================================================================

    #[tokio::test]
    async fn test_gossip_is_not_echoed_to_origin() {
        let accounts = Arc::new(Accounts::default());
        let alice = Secp256k1KeyPair::generate();
        accounts.set(Account::with_balance(alice.address(), U256::from(100)));

        let transport = Arc::new(RecordingTransport {
            peers: vec![[1; 32], [2; 32]],
            ..Default::default()
        });
        let relay = Arc::new(GossipRelay::new(transport.clone(), GossipConfig::default()));
        let service = service(accounts).with_gossip(relay);

        let tx = transfer(&alice, 0, 10);
        service.receive_gossip([1; 32], tx.clone()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(transport.sent.lock().clone(), vec![([2; 32], tx.hash())]);
    }
}
