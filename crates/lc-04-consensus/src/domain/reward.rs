//! Block reward.

use lc_01_state_trie::{StateDb, TrieResult};
use shared_types::{Address, Hash, Receipt, U256};

/// Fees collected by a block: every included transaction pays its fee,
/// reverted ones included.
pub fn collected_fees(receipts: &[Receipt]) -> U256 {
    receipts
        .iter()
        .fold(U256::zero(), |acc, r| acc.saturating_add(r.fee))
}

/// Credits `base_reward + fees` to `producer` on top of `root`.
pub fn credit_reward(
    state: &StateDb,
    root: &Hash,
    producer: &Address,
    base_reward: U256,
    fees: U256,
) -> TrieResult<Hash> {
    let mut account = state.account_or_default(root, producer)?;
    account.balance = account
        .balance
        .saturating_add(base_reward.saturating_add(fees));
    state.put_account(root, &account)
}
