//! Cryptographic error types for `strongbox-crypto-core`.

use thiserror::Error;

/// Errors produced by key-wrapping and secret-derivation operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Caller supplied an unusable argument (empty alias, bad bit length,
    /// password too short for the requested entropy). Raised before any
    /// cryptographic work is performed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Key material of unusable length (KEK not an AES size, key too short).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// AES key wrap refused the input.
    #[error("key wrap failed: {0}")]
    KeyWrap(String),

    /// Wrapped bytes are malformed, truncated, or were wrapped under a
    /// different KEK (integrity check value mismatch).
    #[error("cannot unwrap key")]
    Unwrap,

    /// PBKDF2 or digest failure.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Secure memory allocation or CSPRNG failure.
    #[error("secure memory error: {0}")]
    SecureMemory(String),
}
