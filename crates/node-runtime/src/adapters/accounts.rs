//! Pool account reads against the committed head.

use std::sync::Arc;

use lc_01_state_trie::StateDb;
use lc_02_execution::TxRejection;
use lc_03_tx_pool::AccountSource;
use parking_lot::RwLock;
use shared_types::{Account, Address};

use crate::api::CommittedHead;

/// [`AccountSource`] that always reads the latest committed state root.
pub struct HeadAccountSource {
    state: StateDb,
    head: Arc<RwLock<CommittedHead>>,
}

impl HeadAccountSource {
    pub fn new(state: StateDb, head: Arc<RwLock<CommittedHead>>) -> Self {
        Self { state, head }
    }
}

impl AccountSource for HeadAccountSource {
    fn account(&self, address: &Address) -> Result<Account, TxRejection> {
        let root = self.head.read().state_root;
        self.state
            .account_or_default(&root, address)
            .map_err(TxRejection::State)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_01_state_trie::InMemoryTrieDb;
    use shared_types::{EMPTY_TRIE_ROOT, U256};

    #[test]
    fn test_follows_head_swaps() {
        let state = StateDb::new(Arc::new(InMemoryTrieDb::new()));
        let funded = state
            .put_account(
                &EMPTY_TRIE_ROOT,
                &Account::with_balance([1; 20], U256::from(5)),
            )
            .unwrap();
        let head = Arc::new(RwLock::new(CommittedHead {
            hash: [0; 32],
            height: 0,
            timestamp: 0,
            state_root: EMPTY_TRIE_ROOT,
        }));
        let source = HeadAccountSource::new(state, head.clone());

        assert_eq!(source.account(&[1; 20]).unwrap().balance, U256::zero());
        head.write().state_root = funded;
        assert_eq!(source.account(&[1; 20]).unwrap().balance, U256::from(5));
    }
}
