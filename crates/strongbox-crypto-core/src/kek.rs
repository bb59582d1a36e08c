//! Key-encrypting keys.
//!
//! A [`Kek`] is derived, never stored. [`derive_kek`] turns verified pool
//! entropy plus the pool file's creation stamp into key bytes; the same
//! inputs always give the same key.

use crate::digest::{kek_material, SHA256_LEN};
use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use std::fmt;

/// Default KEK size in bits.
pub const DEFAULT_KEY_BITS: u32 = 256;

/// Largest KEK that can be cut from one SHA-256 output.
pub const MAX_KEY_BITS: u32 = 256;

/// A symmetric key-encrypting key.
///
/// Holds its bytes in a [`SecretBuffer`], so they are wiped when the last
/// owner drops it. Share it behind an `Arc` rather than cloning.
pub struct Kek {
    bytes: SecretBuffer,
}

impl Kek {
    /// Wrap caller-supplied key bytes (1 to 32 bytes).
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyMaterial` if `bytes` is empty or
    /// longer than 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.is_empty() || bytes.len() > SHA256_LEN {
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "KEK must be 1..={SHA256_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: SecretBuffer::new(bytes),
        })
    }

    /// Raw key bytes, for use as an AES key or PBKDF2 salt.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.bytes.expose()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Key size in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.bytes.len().saturating_mul(8)
    }
}

impl fmt::Debug for Kek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kek<{}>(***)", self.bits())
    }
}

/// Check a requested KEK size: positive, a multiple of 8, at most 256.
///
/// # Errors
///
/// Returns `CryptoError::InvalidArgument` otherwise.
pub fn validate_key_bits(key_bits: u32) -> Result<(), CryptoError> {
    if key_bits == 0 || key_bits % 8 != 0 {
        return Err(CryptoError::InvalidArgument(format!(
            "key bits must be a positive multiple of 8, got {key_bits}"
        )));
    }
    if key_bits > MAX_KEY_BITS {
        return Err(CryptoError::InvalidArgument(format!(
            "unsupported key length: {key_bits} bits (maximum {MAX_KEY_BITS})"
        )));
    }
    Ok(())
}

/// Derive a KEK of `key_bits` from pool entropy and the pool creation time
/// in milliseconds since the Unix epoch.
///
/// The key is the first `key_bits / 8` bytes of
/// `SHA-256(be64(created_millis) || entropy)`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidArgument` if `key_bits` is rejected by
/// [`validate_key_bits`], or `CryptoError::KeyDerivation` if `entropy` is
/// empty.
pub fn derive_kek(entropy: &[u8], created_millis: i64, key_bits: u32) -> Result<Kek, CryptoError> {
    validate_key_bits(key_bits)?;
    if entropy.is_empty() {
        return Err(CryptoError::KeyDerivation("no pool entropy supplied".into()));
    }

    let material = kek_material(created_millis, entropy);
    let key_len = usize::try_from(key_bits / 8)
        .map_err(|_| CryptoError::InvalidArgument("key length overflow".into()))?;
    Kek::from_bytes(&material[..key_len])
}
