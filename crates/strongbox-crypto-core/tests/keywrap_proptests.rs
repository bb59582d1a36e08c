#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for AES key wrap.

use proptest::prelude::*;
use strongbox_crypto_core::keywrap::{unwrap, wrap, KeyAlgorithm, WrappedKey};
use strongbox_crypto_core::{CryptoError, Kek};

fn aes_kek() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 16),
        proptest::collection::vec(any::<u8>(), 24),
        proptest::collection::vec(any::<u8>(), 32),
    ]
}

/// Wrappable keys: 2..=16 semiblocks.
fn wrappable_key() -> impl Strategy<Value = Vec<u8>> {
    (2usize..=16).prop_flat_map(|blocks| proptest::collection::vec(any::<u8>(), blocks * 8))
}

proptest! {
    /// unwrap(wrap(k)) == k for every AES-sized KEK.
    #[test]
    fn wrap_unwrap_roundtrip(kek in aes_kek(), key in wrappable_key()) {
        let kek = Kek::from_bytes(&kek).unwrap();
        let wrapped = wrap(&key, &kek).unwrap();
        prop_assert_eq!(wrapped.as_bytes().len(), key.len() + 8);
        let back = unwrap(&wrapped, &kek, KeyAlgorithm::Generic).unwrap();
        prop_assert_eq!(back.material.expose(), key.as_slice());
    }

    /// Any single bit flip in the wrapped bytes is detected.
    #[test]
    fn bit_flip_is_detected(key in wrappable_key(), bit in 0usize..64) {
        let kek = Kek::from_bytes(&[0x33; 32]).unwrap();
        let mut bytes = wrap(&key, &kek).unwrap().into_bytes();
        let idx = (bit / 8) % bytes.len();
        bytes[idx] ^= 1 << (bit % 8);
        let result = unwrap(&WrappedKey::from_bytes(&bytes), &kek, KeyAlgorithm::Generic);
        prop_assert!(matches!(result, Err(CryptoError::Unwrap)));
    }

    /// A different KEK never unwraps.
    #[test]
    fn other_kek_rejected(a in aes_kek(), b in aes_kek(), key in wrappable_key()) {
        prop_assume!(a != b);
        let ka = Kek::from_bytes(&a).unwrap();
        let kb = Kek::from_bytes(&b).unwrap();
        let wrapped = wrap(&key, &ka).unwrap();
        prop_assert!(unwrap(&wrapped, &kb, KeyAlgorithm::Generic).is_err());
    }
}
