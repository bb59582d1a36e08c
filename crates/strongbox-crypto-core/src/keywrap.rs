//! AES key wrap (RFC 3394) under a [`Kek`].
//!
//! This module provides:
//! - [`wrap`]: protect a key for storage, producing a [`WrappedKey`]
//! - [`unwrap`]: recover a key, checking the RFC 3394 integrity value
//! - [`KeyAlgorithm`]: what the caller expects the unwrapped bytes to be
//!
//! Key wrap uses no IV, so wrapping the same key under the same KEK always
//! yields the same bytes. The KEK must be an AES size (128, 192 or 256 bits);
//! the wrapped key must be at least 16 bytes and a multiple of 8.

use crate::error::CryptoError;
use crate::kek::Kek;
use crate::memory::SecretBuffer;
use aes::cipher::generic_array::GenericArray;
use aes_kw::{KekAes128, KekAes192, KekAes256};
use data_encoding::BASE64;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// RFC 3394 semiblock size in bytes.
pub const SEMIBLOCK_LEN: usize = 8;

/// Smallest key RFC 3394 can wrap (two semiblocks).
pub const MIN_KEY_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The kind of key expected back from [`unwrap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyAlgorithm {
    /// AES key: 16, 24 or 32 bytes.
    Aes,
    /// HMAC-SHA-256 key: at least 32 bytes.
    HmacSha256,
    /// HMAC-SHA-512 key: at least 64 bytes.
    HmacSha512,
    /// Opaque key material of any wrappable length.
    Generic,
}

impl KeyAlgorithm {
    /// Whether `len` bytes is a plausible key for this algorithm.
    #[must_use]
    pub const fn accepts_len(self, len: usize) -> bool {
        match self {
            Self::Aes => matches!(len, 16 | 24 | 32),
            Self::HmacSha256 => len >= 32,
            Self::HmacSha512 => len >= 64,
            Self::Generic => true,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aes => "AES",
            Self::HmacSha256 => "HmacSHA256",
            Self::HmacSha512 => "HmacSHA512",
            Self::Generic => "generic",
        }
    }
}

/// Opaque output of [`wrap`]. Callers own its storage.
#[must_use = "a wrapped key must be stored to be useful"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    /// Adopt bytes previously returned by [`WrappedKey::as_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Standard Base64 text form, for text-only stores.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Parse the text form produced by [`WrappedKey::to_base64`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Unwrap` if `text` is not valid Base64.
    pub fn from_base64(text: &str) -> Result<Self, CryptoError> {
        BASE64
            .decode(text.as_bytes())
            .map(Self)
            .map_err(|_| CryptoError::Unwrap)
    }
}

/// A key recovered by [`unwrap`].
#[derive(Debug)]
pub struct UnwrappedKey {
    /// Algorithm the caller asked for and the length was checked against.
    pub algorithm: KeyAlgorithm,
    /// Key bytes, zeroized on drop.
    pub material: SecretBuffer,
}

// ---------------------------------------------------------------------------
// Cipher selection
// ---------------------------------------------------------------------------

enum AesKek {
    Aes128(KekAes128),
    Aes192(KekAes192),
    Aes256(KekAes256),
}

impl AesKek {
    fn new(kek: &Kek) -> Result<Self, CryptoError> {
        let key = kek.expose();
        match key.len() {
            16 => Ok(Self::Aes128(KekAes128::new(GenericArray::from_slice(key)))),
            24 => Ok(Self::Aes192(KekAes192::new(GenericArray::from_slice(key)))),
            32 => Ok(Self::Aes256(KekAes256::new(GenericArray::from_slice(key)))),
            other => Err(CryptoError::InvalidKeyMaterial(format!(
                "KEK must be 16, 24 or 32 bytes for AES key wrap, got {other}"
            ))),
        }
    }

    fn wrap_vec(&self, data: &[u8]) -> Result<Vec<u8>, aes_kw::Error> {
        match self {
            Self::Aes128(k) => k.wrap_vec(data),
            Self::Aes192(k) => k.wrap_vec(data),
            Self::Aes256(k) => k.wrap_vec(data),
        }
    }

    fn unwrap_vec(&self, data: &[u8]) -> Result<Vec<u8>, aes_kw::Error> {
        match self {
            Self::Aes128(k) => k.unwrap_vec(data),
            Self::Aes192(k) => k.unwrap_vec(data),
            Self::Aes256(k) => k.unwrap_vec(data),
        }
    }
}

// ---------------------------------------------------------------------------
// Wrap / unwrap
// ---------------------------------------------------------------------------

/// Wrap `key` under `kek`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyMaterial` if the KEK is not an AES size,
/// or `CryptoError::KeyWrap` if `key` is shorter than 16 bytes or not a
/// multiple of 8 bytes.
pub fn wrap(key: &[u8], kek: &Kek) -> Result<WrappedKey, CryptoError> {
    if key.len() < MIN_KEY_LEN || key.len() % SEMIBLOCK_LEN != 0 {
        return Err(CryptoError::KeyWrap(format!(
            "key must be at least {MIN_KEY_LEN} bytes and a multiple of {SEMIBLOCK_LEN}, got {}",
            key.len()
        )));
    }
    let cipher = AesKek::new(kek)?;
    cipher
        .wrap_vec(key)
        .map(WrappedKey)
        .map_err(|e| CryptoError::KeyWrap(format!("AES key wrap failed: {e}")))
}

/// Unwrap `wrapped` under `kek` and check the result fits `expected`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyMaterial` if the KEK is not an AES size
/// or the recovered key has the wrong length for `expected`.
/// Returns `CryptoError::Unwrap` if the bytes are malformed, truncated, or
/// were wrapped under another KEK.
pub fn unwrap(
    wrapped: &WrappedKey,
    kek: &Kek,
    expected: KeyAlgorithm,
) -> Result<UnwrappedKey, CryptoError> {
    let cipher = AesKek::new(kek)?;
    let plain = Zeroizing::new(
        cipher
            .unwrap_vec(wrapped.as_bytes())
            .map_err(|_| CryptoError::Unwrap)?,
    );

    if !expected.accepts_len(plain.len()) {
        return Err(CryptoError::InvalidKeyMaterial(format!(
            "unwrapped {} bytes, not a valid {} key",
            plain.len(),
            expected.as_str()
        )));
    }

    Ok(UnwrappedKey {
        algorithm: expected,
        material: SecretBuffer::new(&plain),
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
