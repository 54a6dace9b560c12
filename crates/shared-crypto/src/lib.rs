//! # Shared Crypto - Ledger Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Trie nodes, block and transaction hashes |
//! | `ecdsa` | secp256k1 | Recoverable transaction signatures, address derivation |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S signatures
//! - **Addresses**: last 20 bytes of Keccak-256 over the uncompressed public key

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{
    address_from_verifying_key, recover_address, Address, RecoverableSignature, Secp256k1KeyPair,
    SIGNATURE_LENGTH,
};
pub use errors::CryptoError;
pub use hashing::{keccak256, Hash, Keccak256Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
