//! The process-wide key-encrypting key.
//!
//! [`MasterKeyProvider`] derives the KEK from the entropy pool on first use
//! and caches it until [`clear`](MasterKeyProvider::clear) or drop. The
//! cache slot sits behind a mutex held across derivation, so concurrent
//! first callers perform the pool I/O once and all see the same key. A
//! failed derivation leaves the slot empty; nothing is cached on error.

use std::sync::{Arc, Mutex, MutexGuard};

use strongbox_crypto_core::{
    check_key_material_args, check_password_args, derive_kek, key_material, password,
    resolve_password_length, unwrap, wrap, Kek, KeyAlgorithm, SecretBuffer, SecretString,
    UnwrappedKey, WrappedKey,
};

use crate::config::KeyStoreConfig;
use crate::entropy_pool::EntropyPool;
use crate::error::KeyStoreError;

/// Derive the KEK for a pool: ensure it exists, read and verify it, then
/// fold its creation time and entropy into `key_bits` of key.
///
/// Uncached. Every call touches the filesystem.
///
/// # Errors
///
/// Propagates pool errors ([`KeyStoreError::Security`] for a tampered or
/// exposed pool, [`KeyStoreError::Io`] for filesystem failures) and
/// derivation errors.
pub fn derive_master_key(pool: &EntropyPool, key_bits: u32) -> Result<Kek, KeyStoreError> {
    pool.ensure_exists()?;
    let entropy = pool.read_verified()?;
    let created = pool.created_millis()?;
    let kek = derive_kek(entropy.expose(), created, key_bits)?;
    tracing::info!(path = %pool.path().display(), key_bits, "derived master key");
    Ok(kek)
}

/// Lazily derived, cached KEK plus the secret operations built on it.
#[derive(Debug)]
pub struct MasterKeyProvider {
    config: KeyStoreConfig,
    pool: EntropyPool,
    cached: Mutex<Option<Arc<Kek>>>,
}

impl MasterKeyProvider {
    /// Build a provider. No filesystem access happens until the first key
    /// is requested.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidArgument`] if `config` is invalid.
    pub fn new(config: KeyStoreConfig) -> Result<Self, KeyStoreError> {
        let pool = EntropyPool::from_config(&config)?;
        Ok(Self {
            config,
            pool,
            cached: Mutex::new(None),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    #[must_use]
    pub const fn pool(&self) -> &EntropyPool {
        &self.pool
    }

    fn slot(&self) -> Result<MutexGuard<'_, Option<Arc<Kek>>>, KeyStoreError> {
        self.cached.lock().map_err(|_| KeyStoreError::Poisoned)
    }

    /// The KEK, derived on first call and cached afterwards.
    ///
    /// # Errors
    ///
    /// See [`derive_master_key`]. Returns [`KeyStoreError::Poisoned`] if a
    /// thread panicked while holding the cache lock.
    pub fn master_key(&self) -> Result<Arc<Kek>, KeyStoreError> {
        let mut slot = self.slot()?;
        if let Some(kek) = slot.as_ref() {
            tracing::debug!("master key cache hit");
            return Ok(Arc::clone(kek));
        }
        let kek = Arc::new(derive_master_key(&self.pool, self.config.key_bits)?);
        *slot = Some(Arc::clone(&kek));
        Ok(kek)
    }

    /// Whether a KEK is currently cached.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Poisoned`] if the cache lock is poisoned.
    pub fn is_initialized(&self) -> Result<bool, KeyStoreError> {
        Ok(self.slot()?.is_some())
    }

    /// Drop the cached KEK. Its bytes are wiped once the last outstanding
    /// `Arc` handed out by [`master_key`](Self::master_key) is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Poisoned`] if the cache lock is poisoned.
    pub fn clear(&self) -> Result<(), KeyStoreError> {
        self.slot()?.take();
        Ok(())
    }

    // ── Key wrapping ───────────────────────────────────────────────

    /// Wrap `key` under the KEK, deriving it first if needed.
    ///
    /// # Errors
    ///
    /// Returns any [`master_key`](Self::master_key) error, or
    /// [`KeyStoreError::Crypto`] if the key cannot be wrapped.
    pub fn wrap_key(&self, key: &[u8]) -> Result<WrappedKey, KeyStoreError> {
        let kek = self.master_key()?;
        Ok(wrap(key, &kek)?)
    }

    /// Unwrap `wrapped` under the KEK and check it fits `expected`.
    ///
    /// # Errors
    ///
    /// Returns any [`master_key`](Self::master_key) error, or
    /// [`KeyStoreError::Crypto`] wrapping `CryptoError::Unwrap` if the bytes
    /// were tampered with or wrapped under a different KEK.
    pub fn unwrap_key(
        &self,
        wrapped: &WrappedKey,
        expected: KeyAlgorithm,
    ) -> Result<UnwrappedKey, KeyStoreError> {
        let kek = self.master_key()?;
        Ok(unwrap(wrapped, &kek, expected)?)
    }

    // ── Secrets ────────────────────────────────────────────────────

    /// `bit_length` bits of key material for `alias`.
    ///
    /// Arguments are checked before the KEK is touched.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Crypto`] for a bad alias or bit length, or
    /// any [`master_key`](Self::master_key) error.
    pub fn key_material(&self, alias: &str, bit_length: usize) -> Result<SecretBuffer, KeyStoreError> {
        check_key_material_args(alias, bit_length)?;
        let kek = self.master_key()?;
        Ok(key_material(alias, &kek, bit_length)?)
    }

    /// A `length`-character URL-safe password for `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Crypto`] for a bad alias or length, or any
    /// [`master_key`](Self::master_key) error.
    pub fn password(&self, alias: &str, length: usize) -> Result<SecretString, KeyStoreError> {
        check_password_args(alias, length)?;
        let kek = self.master_key()?;
        Ok(password(alias, &kek, length)?)
    }

    /// A password for `alias` carrying at least `min_entropy_bits`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Crypto`] if `length` is too short for the
    /// entropy or the alias is empty, or any
    /// [`master_key`](Self::master_key) error.
    pub fn password_with_entropy(
        &self,
        alias: &str,
        min_entropy_bits: usize,
        length: Option<usize>,
    ) -> Result<SecretString, KeyStoreError> {
        let chosen = resolve_password_length(min_entropy_bits, length)?;
        self.password(alias, chosen)
    }
}

// ── Tests ──────────────────────────────────────────────────────────
