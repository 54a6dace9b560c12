//! # Transaction Validation
//!
//! Pure checks against a transaction and the sender's account as of some
//! state root. None of these touch the trie.

use super::errors::TxRejection;
use rayon::prelude::*;
use shared_crypto::recover_address;
use shared_types::{Account, AccountKind, Address, SignedTransaction};
use std::collections::HashSet;

/// True iff the primary signature recovers to `tx.from`.
pub fn validate_signature(tx: &SignedTransaction) -> bool {
    recover_address(&tx.signing_hash(), &tx.signature)
        .map(|signer| signer == tx.from)
        .unwrap_or(false)
}

/// True iff `tx.nonce` is exactly the account's next nonce.
pub fn validate_nonce(tx: &SignedTransaction, account: &Account) -> bool {
    tx.nonce == account.nonce
}

/// True iff the account can pay `value + fee`. Overflow counts as
/// insufficient.
pub fn validate_balance(tx: &SignedTransaction, account: &Account) -> bool {
    tx.total_cost()
        .map(|cost| account.balance >= cost)
        .unwrap_or(false)
}

/// Check that the transaction's signatures authorise spending from
/// `account`, according to its kind.
///
/// A simple account fails with `BadSignature` when the primary signature
/// does not recover to the sender. A multisig account fails with
/// `Unauthorized` when too few of its signers approved.
pub fn validate_authorization(
    tx: &SignedTransaction,
    account: &Account,
) -> Result<(), TxRejection> {
    match &account.kind {
        AccountKind::Simple => {
            if !validate_signature(tx) {
                return Err(TxRejection::BadSignature);
            }
            Ok(())
        }
        AccountKind::Multisig { signers, threshold } => {
            if *threshold == 0 {
                return Err(TxRejection::Unauthorized("multisig threshold is zero".into()));
            }
            let digest = tx.signing_hash();
            let allowed: HashSet<&Address> = signers.iter().collect();
            let mut approvals: HashSet<Address> = HashSet::new();
            for sig in std::iter::once(&tx.signature).chain(&tx.cosignatures) {
                let signer = recover_address(&digest, sig).map_err(|_| TxRejection::BadSignature)?;
                if allowed.contains(&signer) {
                    approvals.insert(signer);
                }
            }
            if approvals.len() < *threshold as usize {
                return Err(TxRejection::Unauthorized(format!(
                    "{} of {} required signers",
                    approvals.len(),
                    threshold
                )));
            }
            Ok(())
        }
        AccountKind::Contract { .. } => Err(TxRejection::ContractSender(account.address)),
    }
}

/// Every precondition for applying `tx` on top of `account`, in the order
/// authorization, nonce, balance.
pub fn check_transaction(tx: &SignedTransaction, account: &Account) -> Result<(), TxRejection> {
    validate_authorization(tx, account)?;

    if !validate_nonce(tx, account) {
        return Err(TxRejection::BadNonce {
            expected: account.nonce,
            actual: tx.nonce,
        });
    }

    if !validate_balance(tx, account) {
        return Err(TxRejection::InsufficientFunds {
            required: tx.total_cost().unwrap_or(shared_types::U256::MAX),
            available: account.balance,
        });
    }

    Ok(())
}

/// Signature recoverability for every transaction, checked in parallel.
///
/// Only the cryptography is parallel; application stays sequential because
/// later transactions in a block may depend on earlier ones.
pub fn verify_signatures_parallel(txs: &[SignedTransaction]) -> Vec<bool> {
    txs.par_iter()
        .map(|tx| {
            let digest = tx.signing_hash();
            recover_address(&digest, &tx.signature).is_ok()
                && tx
                    .cosignatures
                    .iter()
                    .all(|sig| recover_address(&digest, sig).is_ok())
        })
        .collect()
}

/// Index of the first transaction whose signatures do not recover.
pub fn first_bad_signature(txs: &[SignedTransaction]) -> Option<usize> {
    verify_signatures_parallel(txs).iter().position(|ok| !ok)
}
