//! `strongbox-crypto-core`: Pure key-wrapping and secret-derivation
//! primitives for STRONGBOX.
//!
//! No filesystem, no threads, no global state. The file-backed entropy pool
//! and the cached master key live in `strongbox-keystore`; this crate only
//! turns bytes into keys.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod digest;
pub mod kek;

pub mod keywrap;

pub mod secret;

pub use digest::{digest_matches, kek_material, pool_digest, POOL_DIGEST_SALT, SHA256_LEN};
pub use error::CryptoError;
pub use kek::{derive_kek, validate_key_bits, Kek, DEFAULT_KEY_BITS, MAX_KEY_BITS};
pub use keywrap::{unwrap, wrap, KeyAlgorithm, UnwrappedKey, WrappedKey};
pub use memory::{disable_core_dumps, SecretBuffer, SecretString};
pub use secret::{
    base64_chars_to_byte_count, base64_entropy, bits_to_base64_char_count,
    check_key_material_args, check_password_args, key_material, password, password_with_entropy,
    resolve_password_length, ITERATION_COUNT, PASSWORD_PREFIX,
};
