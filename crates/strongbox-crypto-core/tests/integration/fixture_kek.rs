//! The zero-entropy / zero-timestamp fixture.
//!
//! Never a production pool; it pins the derivation so accidental changes
//! to the stamp encoding or the digest folding show up as test failures.

use sha2::{Digest, Sha256};
use strongbox_crypto_core::{derive_kek, DEFAULT_KEY_BITS};

const FIXTURE_ENTROPY: [u8; 256] = [0u8; 256];

#[test]
fn zero_fixture_is_stable_across_derivations() {
    let a = derive_kek(&FIXTURE_ENTROPY, 0, DEFAULT_KEY_BITS).unwrap();
    let b = derive_kek(&FIXTURE_ENTROPY, 0, DEFAULT_KEY_BITS).unwrap();
    assert_eq!(a.len(), 32);
    assert_eq!(a.expose(), b.expose());
}

#[test]
fn zero_fixture_equals_hash_of_264_zero_bytes() {
    // be64(0) || 256 zero bytes
    let expected = Sha256::digest([0u8; 264]);
    let kek = derive_kek(&FIXTURE_ENTROPY, 0, DEFAULT_KEY_BITS).unwrap();
    assert_eq!(kek.expose(), expected.as_slice());
}

#[test]
fn truncated_fixture_keys() {
    let full = derive_kek(&FIXTURE_ENTROPY, 0, 256).unwrap();
    for bits in [64, 128, 192] {
        let k = derive_kek(&FIXTURE_ENTROPY, 0, bits).unwrap();
        assert_eq!(k.expose(), &full.expose()[..bits as usize / 8]);
    }
}
