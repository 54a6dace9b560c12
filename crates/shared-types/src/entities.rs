//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Accounts**: `Account`, `AccountKind`
//! - **Transactions**: `UnsignedTransaction`, `SignedTransaction`, `Receipt`, `Log`
//! - **Chain**: `Block`, `BlockHeader`, `BlockId`, `FinalityStatus`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_crypto::{CryptoError, Keccak256Hasher, Secp256k1KeyPair};

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// A 65-byte recoverable secp256k1 signature (`r || s || v`).
pub type Signature = shared_crypto::RecoverableSignature;

/// Contract storage slot key.
pub type StorageKey = [u8; 32];

/// Contract storage slot value.
pub type StorageValue = [u8; 32];

/// All-zero hash, used as the genesis parent.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Root of an empty trie: `keccak256(rlp(""))`.
pub const EMPTY_TRIE_ROOT: Hash = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
];

/// Hash of empty contract code: `keccak256("")`.
pub const EMPTY_CODE_HASH: Hash = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

fn u256_bytes(value: &U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// How an account authorises outgoing transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountKind {
    /// Externally owned; the primary signature must recover to the address.
    #[default]
    Simple,
    /// Shared account; `threshold` distinct signatures from `signers` required.
    Multisig {
        signers: Vec<Address>,
        threshold: u8,
    },
    /// Code-bearing account with its own storage trie. Never a sender.
    Contract { code_hash: Hash, storage_root: Hash },
}

/// Account state as committed to the state trie.
///
/// Balance is unsigned, so it can never go negative; the nonce counts
/// applied transactions from this address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub balance: U256,
    pub nonce: u64,
    pub kind: AccountKind,
}

impl Account {
    /// A fresh simple account, as created lazily on first reference.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: U256::zero(),
            nonce: 0,
            kind: AccountKind::Simple,
        }
    }

    pub fn with_balance(address: Address, balance: U256) -> Self {
        Self {
            balance,
            ..Self::new(address)
        }
    }

    pub fn multisig(address: Address, signers: Vec<Address>, threshold: u8, balance: U256) -> Self {
        Self {
            address,
            balance,
            nonce: 0,
            kind: AccountKind::Multisig { signers, threshold },
        }
    }

    pub fn contract(address: Address, code_hash: Hash) -> Self {
        Self {
            address,
            balance: U256::zero(),
            nonce: 0,
            kind: AccountKind::Contract {
                code_hash,
                storage_root: EMPTY_TRIE_ROOT,
            },
        }
    }

    pub fn is_contract(&self) -> bool {
        matches!(self.kind, AccountKind::Contract { .. })
    }

    pub fn code_hash(&self) -> Option<Hash> {
        match &self.kind {
            AccountKind::Contract { code_hash, .. } => Some(*code_hash),
            _ => None,
        }
    }

    pub fn storage_root(&self) -> Option<Hash> {
        match &self.kind {
            AccountKind::Contract { storage_root, .. } => Some(*storage_root),
            _ => None,
        }
    }
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Transaction fields covered by signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub nonce: u64,
    pub fee: U256,
    pub data: Vec<u8>,
}

impl UnsignedTransaction {
    /// Digest that every signature on this transaction commits to.
    pub fn signing_hash(&self) -> Hash {
        signing_hash(
            &self.from, &self.to, &self.value, self.nonce, &self.fee, &self.data,
        )
    }

    /// Sign with a single key (simple accounts).
    pub fn sign(self, keypair: &Secp256k1KeyPair) -> Result<SignedTransaction, CryptoError> {
        let signature = keypair.sign_prehash(&self.signing_hash())?;
        Ok(SignedTransaction {
            from: self.from,
            to: self.to,
            value: self.value,
            nonce: self.nonce,
            fee: self.fee,
            data: self.data,
            signature,
            cosignatures: Vec::new(),
        })
    }

    /// Sign with several keys (multisig accounts). The first key provides
    /// the primary signature, the rest become cosignatures.
    pub fn sign_multi(
        self,
        keypairs: &[&Secp256k1KeyPair],
    ) -> Result<SignedTransaction, CryptoError> {
        let digest = self.signing_hash();
        let (first, rest) = keypairs
            .split_first()
            .ok_or_else(|| CryptoError::SigningFailed("no signing keys".into()))?;

        let mut tx = self.sign(first)?;
        for keypair in rest {
            tx.cosignatures.push(keypair.sign_prehash(&digest)?);
        }
        Ok(tx)
    }
}

fn signing_hash(
    from: &Address,
    to: &Address,
    value: &U256,
    nonce: u64,
    fee: &U256,
    data: &[u8],
) -> Hash {
    let mut hasher = Keccak256Hasher::new();
    hasher
        .update(from)
        .update(to)
        .update(&u256_bytes(value))
        .update(&nonce.to_be_bytes())
        .update(&u256_bytes(fee))
        .update(&(data.len() as u64).to_be_bytes())
        .update(data);
    hasher.finalize()
}

/// A transaction as submitted by clients and carried in blocks.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Sending account.
    pub from: Address,
    /// Receiving account (created lazily if unknown).
    pub to: Address,
    /// Amount moved from `from` to `to`.
    pub value: U256,
    /// Must equal the sender's on-trie nonce at application time.
    pub nonce: u64,
    /// Flat fee paid to the block producer.
    pub fee: U256,
    /// Opaque payload handed to the transaction executor.
    pub data: Vec<u8>,
    /// Primary recoverable signature.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    /// Additional signatures for multisig senders.
    #[serde_as(as = "Vec<Bytes>")]
    pub cosignatures: Vec<Signature>,
}

/// Fixed encoded size of a transaction without payload or cosignatures.
const TX_FIXED_SIZE: u64 = 20 + 20 + 32 + 8 + 32 + 8 + 65 + 8;

impl SignedTransaction {
    /// Digest covered by the signatures.
    pub fn signing_hash(&self) -> Hash {
        signing_hash(
            &self.from, &self.to, &self.value, self.nonce, &self.fee, &self.data,
        )
    }

    /// Transaction hash: commits to the signed fields and every signature.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256Hasher::new();
        hasher.update(&self.signing_hash()).update(&self.signature);
        for cosig in &self.cosignatures {
            hasher.update(cosig);
        }
        hasher.finalize()
    }

    /// Total debit from the sender, `None` on overflow.
    pub fn total_cost(&self) -> Option<U256> {
        self.value.checked_add(self.fee)
    }

    /// Serialized size in bytes, used for pool and block size accounting.
    pub fn size_bytes(&self) -> u64 {
        TX_FIXED_SIZE + self.data.len() as u64 + 65 * self.cosignatures.len() as u64
    }
}

/// An event emitted by transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Account that emitted the log.
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

/// Outcome of an included transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// Value moved and executor effects committed.
    Success,
    /// Executor failed; fee charged and nonce bumped, nothing else.
    Reverted,
}

/// Receipt recorded for every transaction in an applied block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: Hash,
    pub tx_index: u32,
    pub block_hash: Hash,
    pub block_height: u64,
    pub from: Address,
    pub to: Address,
    pub fee: U256,
    pub status: ReceiptStatus,
    pub logs: Vec<Log>,
}

// =============================================================================
// CHAIN
// =============================================================================

/// Block header. The block hash commits to every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Parent height + 1; genesis is 0.
    pub height: u64,
    pub parent_hash: Hash,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Account credited with the block reward.
    pub producer: Address,
    /// Commitment to the ordered transaction list.
    pub transactions_root: Hash,
    /// State root after applying every transaction and the reward.
    pub state_root: Hash,
}

/// Fixed encoded size of a header.
const HEADER_SIZE: u64 = 8 + 32 + 8 + 20 + 32 + 32;

impl BlockHeader {
    /// Content hash over the header fields.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256Hasher::new();
        hasher
            .update(&self.height.to_be_bytes())
            .update(&self.parent_hash)
            .update(&self.timestamp.to_be_bytes())
            .update(&self.producer)
            .update(&self.transactions_root)
            .update(&self.state_root);
        hasher.finalize()
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.parent_hash == ZERO_HASH
    }
}

/// A block: header plus ordered transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<SignedTransaction>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }

    /// Serialized size in bytes, checked against the dynamic size limit.
    pub fn size_bytes(&self) -> u64 {
        HEADER_SIZE
            + 8
            + self
                .transactions
                .iter()
                .map(SignedTransaction::size_bytes)
                .sum::<u64>()
    }

    /// Total fees carried by the block's transactions.
    pub fn total_fees(&self) -> U256 {
        self.transactions
            .iter()
            .fold(U256::zero(), |acc, tx| acc.saturating_add(tx.fee))
    }
}

/// Commitment to an ordered list of transactions.
pub fn transactions_root(transactions: &[SignedTransaction]) -> Hash {
    let mut hasher = Keccak256Hasher::new();
    hasher.update(&(transactions.len() as u64).to_be_bytes());
    for tx in transactions {
        hasher.update(&tx.hash());
    }
    hasher.finalize()
}

/// Block lookup key for point queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    Height(u64),
    Hash(Hash),
}

/// Finality classification of a block.
///
/// Only `Pending -> Finalized` and `Pending -> Orphaned` exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalityStatus {
    Pending,
    Finalized,
    Orphaned,
}

impl FinalityStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FinalityStatus::Pending)
    }
}
