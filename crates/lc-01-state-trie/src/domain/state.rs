//! # Account State View
//!
//! Accounts live in the account trie keyed by their raw 20-byte address,
//! encoded with bincode. Contract storage lives in a per-contract storage
//! trie whose root is carried in the account; both share one node store.
//!
//! A zero storage value is never stored: writing zero deletes the slot.

use super::errors::{TrieError, TrieResult};
use super::trie::{PatriciaMerkleTrie, TrieProof};
use crate::ports::TrieDatabase;
use serde::{Deserialize, Serialize};
use shared_types::{Account, AccountKind, Address, Hash, StorageKey, StorageValue};
use std::sync::Arc;

/// Typed account and storage access on top of [`PatriciaMerkleTrie`].
#[derive(Clone)]
pub struct StateDb {
    trie: PatriciaMerkleTrie,
}

impl StateDb {
    pub fn new(db: Arc<dyn TrieDatabase>) -> Self {
        Self {
            trie: PatriciaMerkleTrie::new(db),
        }
    }

    pub fn from_trie(trie: PatriciaMerkleTrie) -> Self {
        Self { trie }
    }

    pub fn trie(&self) -> &PatriciaMerkleTrie {
        &self.trie
    }

    pub fn get_account(&self, root: &Hash, address: &Address) -> TrieResult<Option<Account>> {
        self.trie
            .get(root, address)?
            .map(|bytes| decode_account(&bytes))
            .transpose()
    }

    /// The account at `address`, or a fresh zero-balance account if absent.
    pub fn account_or_default(&self, root: &Hash, address: &Address) -> TrieResult<Account> {
        Ok(self
            .get_account(root, address)?
            .unwrap_or_else(|| Account::new(*address)))
    }

    pub fn put_account(&self, root: &Hash, account: &Account) -> TrieResult<Hash> {
        self.trie
            .set(root, &account.address, encode_account(account)?)
    }

    /// Batch write of several accounts in one trie update.
    pub fn put_accounts(&self, root: &Hash, accounts: &[Account]) -> TrieResult<Hash> {
        let writes = accounts
            .iter()
            .map(|a| -> TrieResult<(Vec<u8>, Option<Vec<u8>>)> {
                Ok((a.address.to_vec(), Some(encode_account(a)?)))
            })
            .collect::<TrieResult<Vec<_>>>()?;
        self.trie.update(root, writes)
    }

    pub fn delete_account(&self, root: &Hash, address: &Address) -> TrieResult<Hash> {
        self.trie.delete(root, address)
    }

    /// Storage slot of a contract. Non-contracts and absent accounts have no
    /// storage and read as `None`.
    pub fn get_storage(
        &self,
        root: &Hash,
        address: &Address,
        key: &StorageKey,
    ) -> TrieResult<Option<StorageValue>> {
        let Some(storage_root) = self
            .get_account(root, address)?
            .and_then(|a| a.storage_root())
        else {
            return Ok(None);
        };

        self.trie
            .get(&storage_root, key)?
            .map(|bytes| to_storage_value(&bytes))
            .transpose()
    }

    /// Write a contract storage slot and return the new state root.
    pub fn set_storage(
        &self,
        root: &Hash,
        address: &Address,
        key: &StorageKey,
        value: &StorageValue,
    ) -> TrieResult<Hash> {
        let mut account = self
            .get_account(root, address)?
            .filter(Account::is_contract)
            .ok_or(TrieError::NotAContract(*address))?;

        if let AccountKind::Contract { storage_root, .. } = &mut account.kind {
            let current = *storage_root;
            *storage_root = if *value == [0u8; 32] {
                self.trie.delete(&current, key)?
            } else {
                self.trie.set(&current, key, value.to_vec())?
            };
        }
        self.put_account(root, &account)
    }

    /// Proof of an account (and optionally one storage slot) under `root`.
    pub fn account_proof(
        &self,
        root: &Hash,
        address: &Address,
        storage_key: Option<&StorageKey>,
    ) -> TrieResult<AccountProof> {
        let account = self.get_account(root, address)?;
        let account_proof = self.trie.generate_proof(root, address)?;

        let storage = match (storage_key, account.as_ref().and_then(Account::storage_root)) {
            (Some(key), Some(storage_root)) => Some(StorageProof {
                key: *key,
                value: self.get_storage(root, address, key)?,
                proof: self.trie.generate_proof(&storage_root, key)?,
            }),
            _ => None,
        };

        Ok(AccountProof {
            address: *address,
            state_root: *root,
            account,
            account_proof,
            storage,
        })
    }
}

fn encode_account(account: &Account) -> TrieResult<Vec<u8>> {
    bincode::serialize(account).map_err(|e| TrieError::Codec(e.to_string()))
}

fn decode_account(bytes: &[u8]) -> TrieResult<Account> {
    bincode::deserialize(bytes).map_err(|e| TrieError::Codec(e.to_string()))
}

fn to_storage_value(bytes: &[u8]) -> TrieResult<StorageValue> {
    bytes
        .try_into()
        .map_err(|_| TrieError::Codec(format!("storage value of {} bytes", bytes.len())))
}

// =============================================================================
// PROOFS
// =============================================================================

/// Storage slot proof against a contract's storage root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProof {
    pub key: StorageKey,
    /// `None` for an exclusion proof.
    pub value: Option<StorageValue>,
    pub proof: TrieProof,
}

/// Account inclusion/exclusion proof, verifiable without the node store.
///
/// - **Inclusion**: `account` is `Some`.
/// - **Exclusion**: `account` is `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProof {
    pub address: Address,
    pub state_root: Hash,
    pub account: Option<Account>,
    pub account_proof: TrieProof,
    pub storage: Option<StorageProof>,
}

impl AccountProof {
    pub fn is_exclusion_proof(&self) -> bool {
        self.account.is_none()
    }

    /// Check the proof against its own `state_root`.
    pub fn verify(&self) -> bool {
        self.verify_against(&self.state_root)
    }

    /// Check the proof against a root obtained independently (e.g. from a
    /// block header).
    pub fn verify_against(&self, state_root: &Hash) -> bool {
        let encoded = match self.account.as_ref().map(encode_account).transpose() {
            Ok(encoded) => encoded,
            Err(_) => return false,
        };
        if !PatriciaMerkleTrie::verify_proof(
            &self.address,
            encoded.as_deref(),
            &self.account_proof,
            state_root,
        ) {
            return false;
        }

        match (&self.storage, self.account.as_ref().and_then(Account::storage_root)) {
            (None, _) => true,
            (Some(storage), Some(storage_root)) => PatriciaMerkleTrie::verify_proof(
                &storage.key,
                storage.value.as_ref().map(|v| &v[..]),
                &storage.proof,
                &storage_root,
            ),
            (Some(_), None) => false,
        }
    }

    pub fn to_bytes(&self) -> TrieResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| TrieError::Codec(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> TrieResult<Self> {
        bincode::deserialize(bytes).map_err(|e| TrieError::Codec(e.to_string()))
    }
}
