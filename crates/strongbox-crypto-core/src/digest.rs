//! SHA-256 helpers for the entropy pool.
//!
//! - [`pool_digest`]: integrity digest stored next to the pool entropy
//! - [`digest_matches`]: constant-time check of a stored digest segment
//! - [`kek_material`]: folds the pool creation stamp and entropy into KEK bytes

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// SHA-256 output length in bytes.
pub const SHA256_LEN: usize = 32;

/// Fixed, non-secret prefix hashed in front of the entropy when computing
/// the pool integrity digest. Part of the on-disk format.
pub const POOL_DIGEST_SALT: &[u8] = b"Just for checksumming";

/// Width of the serialized creation stamp.
pub const STAMP_LEN: usize = 8;

/// `SHA-256(POOL_DIGEST_SALT || entropy)`.
#[must_use]
pub fn pool_digest(entropy: &[u8]) -> Zeroizing<[u8; SHA256_LEN]> {
    let mut hasher = Sha256::new();
    hasher.update(POOL_DIGEST_SALT);
    hasher.update(entropy);
    Zeroizing::new(hasher.finalize().into())
}

/// Compare `stored` against the leading `stored.len()` bytes of the pool
/// digest of `entropy`, in constant time.
///
/// An empty or over-long `stored` segment never matches.
#[must_use]
pub fn digest_matches(entropy: &[u8], stored: &[u8]) -> bool {
    if stored.is_empty() || stored.len() > SHA256_LEN {
        return false;
    }
    let expected = pool_digest(entropy);
    bool::from(expected[..stored.len()].ct_eq(stored))
}

/// Big-endian encoding of a millisecond timestamp.
#[must_use]
pub const fn stamp_bytes(created_millis: i64) -> [u8; STAMP_LEN] {
    created_millis.to_be_bytes()
}

/// Digest the creation stamp, then the entropy, with a single SHA-256
/// instance: `SHA-256(stamp || entropy)`.
///
/// The two updates go to the same hasher; the stamp is not hashed on its
/// own first. Changing this changes every KEK ever derived.
#[must_use]
pub fn kek_material(created_millis: i64, entropy: &[u8]) -> Zeroizing<[u8; SHA256_LEN]> {
    let mut hasher = Sha256::new();
    hasher.update(stamp_bytes(created_millis));
    hasher.update(entropy);
    Zeroizing::new(hasher.finalize().into())
}
