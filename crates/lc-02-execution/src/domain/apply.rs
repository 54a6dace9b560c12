//! # Transaction Application
//!
//! `apply` moves a state root forward by exactly one transaction. Because the
//! trie is copy-on-write, the input root is never touched: a rejection simply
//! returns no new root, so there is nothing to roll back.

use super::errors::{ExecutionError, TxRejection};
use super::validation::check_transaction;
use crate::ports::{ExecutionContext, ExecutionOutcome, TransactionExecutor};
use lc_01_state_trie::StateDb;
use shared_types::{Account, Hash, Receipt, ReceiptStatus, SignedTransaction, ZERO_HASH};
use tracing::debug;

/// New state root plus the receipt for one applied transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransaction {
    pub state_root: Hash,
    pub receipt: Receipt,
}

/// Apply `tx` on top of `root`.
///
/// On success the sender is debited `value + fee`, the recipient credited
/// `value`, the sender nonce bumped and executor storage writes committed.
/// If the executor fails the transaction is still included: only the fee
/// is charged, the nonce is bumped and the receipt is `Reverted`.
///
/// The fee is not credited anywhere here; the block producer collects all
/// fees with the block reward.
pub fn apply(
    state: &StateDb,
    root: &Hash,
    tx: &SignedTransaction,
    ctx: &ExecutionContext,
    executor: &dyn TransactionExecutor,
) -> Result<AppliedTransaction, TxRejection> {
    let sender = state.account_or_default(root, &tx.from)?;
    check_transaction(tx, &sender)?;

    let mut receipt = Receipt {
        tx_hash: tx.hash(),
        tx_index: ctx.tx_index,
        block_hash: ZERO_HASH,
        block_height: ctx.block_height,
        from: tx.from,
        to: tx.to,
        fee: tx.fee,
        status: ReceiptStatus::Success,
        logs: Vec::new(),
    };

    let executed = executor
        .execute(ctx, tx)
        .and_then(|outcome| check_storage_targets(state, root, &outcome).map(|()| outcome));

    let state_root = match executed {
        Ok(outcome) => {
            let new_root = transfer(state, root, tx, sender, &outcome)?;
            receipt.logs = outcome.logs;
            new_root
        }
        Err(e) => {
            debug!(tx = %hex::encode(receipt.tx_hash), error = %e, "execution reverted");
            receipt.status = ReceiptStatus::Reverted;
            charge_fee(state, root, tx, sender)?
        }
    };

    Ok(AppliedTransaction {
        state_root,
        receipt,
    })
}

fn bump_nonce(account: &mut Account) -> Result<(), TxRejection> {
    account.nonce = account
        .nonce
        .checked_add(1)
        .ok_or(TxRejection::BadNonce {
            expected: account.nonce,
            actual: account.nonce,
        })?;
    Ok(())
}

fn transfer(
    state: &StateDb,
    root: &Hash,
    tx: &SignedTransaction,
    mut sender: Account,
    outcome: &ExecutionOutcome,
) -> Result<Hash, TxRejection> {
    let cost = tx.total_cost().ok_or(TxRejection::BalanceOverflow)?;
    sender.balance -= cost;
    bump_nonce(&mut sender)?;
    let root = state.put_account(root, &sender)?;

    // Re-read after the debit so a self-transfer sees its own update.
    let mut recipient = state.account_or_default(&root, &tx.to)?;
    recipient.balance = recipient
        .balance
        .checked_add(tx.value)
        .ok_or(TxRejection::BalanceOverflow)?;
    let mut root = state.put_account(&root, &recipient)?;

    for write in &outcome.storage_writes {
        root = state.set_storage(&root, &write.address, &write.key, &write.value)?;
    }
    Ok(root)
}

fn charge_fee(
    state: &StateDb,
    root: &Hash,
    tx: &SignedTransaction,
    mut sender: Account,
) -> Result<Hash, TxRejection> {
    sender.balance -= tx.fee;
    bump_nonce(&mut sender)?;
    Ok(state.put_account(root, &sender)?)
}

/// Storage writes may only target existing contracts.
fn check_storage_targets(
    state: &StateDb,
    root: &Hash,
    outcome: &ExecutionOutcome,
) -> Result<(), ExecutionError> {
    for write in &outcome.storage_writes {
        let is_contract = state
            .get_account(root, &write.address)
            .map_err(|e| ExecutionError::StorageWrite(e.to_string()))?
            .is_some_and(|a| a.is_contract());
        if !is_contract {
            return Err(ExecutionError::StorageWrite(format!(
                "{} is not a contract",
                hex::encode(write.address)
            )));
        }
    }
    Ok(())
}
