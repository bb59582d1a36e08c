//! `strongbox-keystore`: File-backed entropy pool and cached master key
//! for STRONGBOX.
//!
//! Owns everything stateful: the on-disk entropy pool, its permission
//! checks, the lazily derived KEK, and persistence of wrapped keys through
//! a caller-supplied property store.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod config;
pub mod error;
pub mod permissions;

pub mod entropy_pool;
pub mod master_key;

pub mod property_store;
pub mod wrapped_keys;

pub use config::{
    validate_pool_sizes, KeyStoreConfig, DEFAULT_DIGEST_BYTES, DEFAULT_ENTROPY_BYTES,
    MIN_ENTROPY_BYTES,
};
pub use entropy_pool::{EntropyPool, PoolOrigin, PoolProbe};
pub use error::KeyStoreError;
pub use master_key::{derive_master_key, MasterKeyProvider};
pub use permissions::{
    select as select_permission_policy, PermissionModel, PermissionPolicy, PosixOwnerRead,
    ReadOnlyAttribute, OWNER_READ_MODE,
};
pub use property_store::{JsonFilePropertyStore, MemoryPropertyStore, PropertyStore};
pub use wrapped_keys::{WrappedKeyStore, WRAPPED_KEY_PREFIX};
