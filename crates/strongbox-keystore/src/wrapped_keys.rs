//! Wrapped keys persisted by alias.
//!
//! Each key is wrapped under the master KEK and stored as Base64 text
//! under `wrappedKey.<alias>` in a [`PropertyStore`]. Plaintext keys never
//! reach the store.

use std::sync::Arc;

use strongbox_crypto_core::{KeyAlgorithm, UnwrappedKey, WrappedKey};

use crate::error::KeyStoreError;
use crate::master_key::MasterKeyProvider;
use crate::property_store::PropertyStore;

/// Property key prefix for wrapped keys.
pub const WRAPPED_KEY_PREFIX: &str = "wrappedKey.";

/// Wraps on the way in, unwraps on the way out.
#[derive(Debug)]
pub struct WrappedKeyStore<S> {
    provider: Arc<MasterKeyProvider>,
    store: S,
}

impl<S: PropertyStore> WrappedKeyStore<S> {
    pub const fn new(provider: Arc<MasterKeyProvider>, store: S) -> Self {
        Self { provider, store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn property_key(alias: &str) -> Result<String, KeyStoreError> {
        if alias.is_empty() {
            return Err(KeyStoreError::InvalidArgument("alias is empty".into()));
        }
        Ok(format!("{WRAPPED_KEY_PREFIX}{alias}"))
    }

    /// Wrap `key` and store it under `alias`, replacing any previous key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidArgument`] for an empty alias, any
    /// wrapping or master-key error, or a store error.
    pub fn put(&self, alias: &str, key: &[u8]) -> Result<WrappedKey, KeyStoreError> {
        let property = Self::property_key(alias)?;
        let wrapped = self.provider.wrap_key(key)?;
        self.store.set(&property, &wrapped.to_base64())?;
        Ok(wrapped)
    }

    /// The wrapped bytes stored under `alias`, exactly as stored.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::MissingAlias`] if nothing is stored,
    /// `CryptoError::Unwrap` if the stored text is not Base64, or a store
    /// error.
    pub fn get_wrapped(&self, alias: &str) -> Result<WrappedKey, KeyStoreError> {
        let property = Self::property_key(alias)?;
        let text = self
            .store
            .get(&property)?
            .ok_or_else(|| KeyStoreError::MissingAlias(alias.to_owned()))?;
        Ok(WrappedKey::from_base64(&text)?)
    }

    /// Load and unwrap the key stored under `alias`.
    ///
    /// # Errors
    ///
    /// As [`get_wrapped`](Self::get_wrapped), plus `CryptoError::Unwrap`
    /// if the stored key was tampered with or wrapped under another KEK.
    pub fn get(&self, alias: &str, expected: KeyAlgorithm) -> Result<UnwrappedKey, KeyStoreError> {
        let wrapped = self.get_wrapped(alias)?;
        self.provider.unwrap_key(&wrapped, expected)
    }

    /// Whether a key is stored under `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidArgument`] for an empty alias or a
    /// store error.
    pub fn contains(&self, alias: &str) -> Result<bool, KeyStoreError> {
        let property = Self::property_key(alias)?;
        Ok(self.store.get(&property)?.is_some())
    }
}
