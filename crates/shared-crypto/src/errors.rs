//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Signature bytes do not form a valid (r, s) pair
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Recovery id byte outside {0, 1}
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Public key could not be recovered from the signature
    #[error("Public key recovery failed")]
    RecoveryFailed,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Signing the prehash failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}
