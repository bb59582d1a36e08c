//! Deterministic secret and password derivation from an alias and a KEK.
//!
//! This module provides:
//! - [`key_material`]: `bit_length / 8` bytes of PBKDF2-HMAC-SHA-512 output
//! - [`password`]: a URL/filename-safe Base64 password of an exact length
//! - [`password_with_entropy`]: a password carrying at least N bits of entropy
//!
//! Nothing is stored and nothing is random: the same alias, KEK and length
//! always reproduce the same secret, so a program can re-derive its keys
//! and passwords on every start instead of saving them.
//!
//! # Alias namespacing
//!
//! Password derivation prefixes the alias with [`PASSWORD_PREFIX`] before
//! running PBKDF2. A password and key material derived from the same
//! visible alias therefore come from different PBKDF2 inputs, and the
//! password is never the Base64 encoding of that key material.
//!
//! # Example
//!
//! ```
//! use strongbox_crypto_core::{secret, Kek};
//!
//! let kek = Kek::from_bytes(&[7u8; 32]).unwrap();
//! let db_key = secret::key_material("Check Request Key", &kek, 512).unwrap();
//! let db_pwd = secret::password_with_entropy("Check Request Key", &kek, 512, None).unwrap();
//! assert_eq!(db_key.len(), 64);
//! assert_eq!(db_pwd.len(), 86);
//! ```

use crate::error::CryptoError;
use crate::kek::Kek;
use crate::memory::{SecretBuffer, SecretString};
use data_encoding::BASE64URL;
use sha2::Sha512;
use zeroize::Zeroizing;

/// PBKDF2 iteration count. Fixed: changing it changes every derived secret.
pub const ITERATION_COUNT: u32 = 1003;

/// Tag prepended to aliases used for password derivation.
pub const PASSWORD_PREFIX: &str = "PasswordAlias:";

/// Entropy carried by one Base64 character.
pub const BITS_PER_BASE64_CHAR: usize = 6;

// ---------------------------------------------------------------------------
// Key material
// ---------------------------------------------------------------------------

/// Stretch `alias` and `kek` into `bit_length / 8` bytes.
///
/// PBKDF2-HMAC-SHA-512 with the UTF-8 alias as password, the KEK bytes as
/// salt and [`ITERATION_COUNT`] rounds.
///
/// # Errors
///
/// Returns `CryptoError::InvalidArgument` if `alias` is empty, `kek` is
/// empty, or `bit_length` is zero or not a multiple of 8.
pub fn key_material(alias: &str, kek: &Kek, bit_length: usize) -> Result<SecretBuffer, CryptoError> {
    check_key_material_args(alias, bit_length)?;
    check_kek(kek)?;
    Ok(stretch(alias.as_bytes(), kek, bit_length / 8))
}

/// Argument checks for [`key_material`], without a KEK.
///
/// Lets callers that must do I/O to obtain a KEK reject bad arguments first.
///
/// # Errors
///
/// Returns `CryptoError::InvalidArgument` if `alias` is empty or
/// `bit_length` is zero or not a multiple of 8.
pub fn check_key_material_args(alias: &str, bit_length: usize) -> Result<(), CryptoError> {
    if alias.is_empty() {
        return Err(CryptoError::InvalidArgument("alias is empty".into()));
    }
    if bit_length < 8 || bit_length % 8 != 0 {
        return Err(CryptoError::InvalidArgument(format!(
            "bit length must be a positive multiple of 8, got {bit_length}"
        )));
    }
    Ok(())
}

fn check_kek(kek: &Kek) -> Result<(), CryptoError> {
    if kek.is_empty() {
        return Err(CryptoError::InvalidArgument("KEK is empty".into()));
    }
    Ok(())
}

fn stretch(password: &[u8], kek: &Kek, out_len: usize) -> SecretBuffer {
    let mut output = Zeroizing::new(vec![0u8; out_len]);
    pbkdf2::pbkdf2_hmac::<Sha512>(password, kek.expose(), ITERATION_COUNT, &mut output);
    SecretBuffer::new(&output)
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Derive a password of exactly `length` characters from the URL-safe
/// Base64 alphabet (`A-Z a-z 0-9 - _`).
///
/// # Errors
///
/// Returns `CryptoError::InvalidArgument` if `alias` is empty, `kek` is
/// empty, or `length` is zero.
pub fn password(alias: &str, kek: &Kek, length: usize) -> Result<SecretString, CryptoError> {
    check_password_args(alias, length)?;
    check_kek(kek)?;

    let mut tagged = Zeroizing::new(String::with_capacity(
        PASSWORD_PREFIX.len().saturating_add(alias.len()),
    ));
    tagged.push_str(PASSWORD_PREFIX);
    tagged.push_str(alias);

    let byte_count = base64_chars_to_byte_count(length);
    let material = stretch(tagged.as_bytes(), kek, byte_count);

    let mut encoded = Zeroizing::new(vec![0u8; BASE64URL.encode_len(material.len())]);
    BASE64URL.encode_mut(material.expose(), &mut encoded);
    encoded.truncate(length);

    let chars = std::mem::take(&mut *encoded);
    String::from_utf8(chars).map(Zeroizing::new).map_err(|e| {
        drop(Zeroizing::new(e.into_bytes()));
        CryptoError::KeyDerivation("Base64 output was not ASCII".into())
    })
}

/// Derive a password carrying at least `min_entropy_bits` of entropy.
///
/// With `length: None` the shortest such password is returned. With
/// `Some(n)` the password has exactly `n` characters, provided `n` is long
/// enough to carry the requested entropy.
///
/// # Errors
///
/// Returns `CryptoError::InvalidArgument` if `min_entropy_bits` is zero,
/// `length` is `Some(0)`, or `length` is too short for the entropy.
pub fn password_with_entropy(
    alias: &str,
    kek: &Kek,
    min_entropy_bits: usize,
    length: Option<usize>,
) -> Result<SecretString, CryptoError> {
    let chosen = resolve_password_length(min_entropy_bits, length)?;
    password(alias, kek, chosen)
}

/// Argument checks for [`password`], without a KEK.
///
/// # Errors
///
/// Returns `CryptoError::InvalidArgument` if `alias` is empty or `length`
/// is zero.
pub fn check_password_args(alias: &str, length: usize) -> Result<(), CryptoError> {
    if alias.is_empty() {
        return Err(CryptoError::InvalidArgument("alias is empty".into()));
    }
    if length == 0 {
        return Err(CryptoError::InvalidArgument(
            "password length must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Pick the password length for [`password_with_entropy`]: the requested
/// length if it carries `min_entropy_bits`, else the minimum when no length
/// was requested.
///
/// # Errors
///
/// Returns `CryptoError::InvalidArgument` if `min_entropy_bits` is zero,
/// `length` is `Some(0)`, or `length` is too short for the entropy.
pub fn resolve_password_length(
    min_entropy_bits: usize,
    length: Option<usize>,
) -> Result<usize, CryptoError> {
    if min_entropy_bits == 0 {
        return Err(CryptoError::InvalidArgument(
            "minimum entropy must be at least 1 bit".into(),
        ));
    }
    let minimum = bits_to_base64_char_count(min_entropy_bits);
    match length {
        None => Ok(minimum),
        Some(0) => Err(CryptoError::InvalidArgument(
            "password length must be at least 1".into(),
        )),
        Some(n) if n < minimum => Err(CryptoError::InvalidArgument(format!(
            "password length {n} too short for {min_entropy_bits} bits of entropy \
             (need {minimum} characters)"
        ))),
        Some(n) => Ok(n),
    }
}

// ---------------------------------------------------------------------------
// Base64 accounting
// ---------------------------------------------------------------------------

/// Characters needed to carry `bits` of entropy: `ceil(bits / 6)`.
#[must_use]
pub const fn bits_to_base64_char_count(bits: usize) -> usize {
    bits.div_ceil(BITS_PER_BASE64_CHAR)
}

/// Bytes to Base64-encode to get at least `chars` characters without
/// padding: `3 * ceil(chars / 4)`.
#[must_use]
pub const fn base64_chars_to_byte_count(chars: usize) -> usize {
    chars.div_ceil(4).saturating_mul(3)
}

/// Entropy of a pseudorandom Base64 password of `chars` characters.
#[must_use]
pub const fn base64_entropy(chars: usize) -> usize {
    chars.saturating_mul(BITS_PER_BASE64_CHAR)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
