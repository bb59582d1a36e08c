//! Keystore error types for `strongbox-keystore`.

use strongbox_crypto_core::CryptoError;
use thiserror::Error;

/// Errors produced by entropy-pool, master-key and store operations.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// Cryptographic operation failed (delegated from crypto-core).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Bad configuration value, rejected before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The entropy pool failed a permission, type, size or integrity check.
    /// Never repaired automatically.
    #[error("security violation: {0}")]
    Security(String),

    /// Filesystem failure outside the integrity checks.
    #[error("I/O error {context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file missing, unreadable or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Property store failure.
    #[error("property store error: {0}")]
    Store(String),

    /// No wrapped key is recorded under this alias.
    #[error("no wrapped key stored for alias: {0}")]
    MissingAlias(String),

    /// A thread panicked while holding the master-key cache lock.
    #[error("master key cache lock poisoned")]
    Poisoned,
}

impl KeyStoreError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error means the entropy pool or a wrapped key was
    /// tampered with, exposed, or unwrapped under the wrong KEK.
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::Security(_) | Self::Crypto(CryptoError::Unwrap))
    }
}
