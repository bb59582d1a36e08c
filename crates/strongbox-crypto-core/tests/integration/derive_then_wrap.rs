//! Derive a KEK, derive a data key from an alias, wrap it, unwrap it.

use strongbox_crypto_core::keywrap::{unwrap, wrap, KeyAlgorithm, WrappedKey};
use strongbox_crypto_core::secret::{key_material, password_with_entropy};
use strongbox_crypto_core::{derive_kek, SecretBuffer};

#[test]
fn alias_key_survives_wrap_cycle() {
    let entropy = SecretBuffer::random(256).unwrap();
    let kek = derive_kek(entropy.expose(), 1_700_000_000_000, 256).unwrap();

    let data_key = key_material("Check Request Key", &kek, 256).unwrap();
    let wrapped = wrap(data_key.expose(), &kek).unwrap();

    // stored as text by some external property store, then read back
    let stored = wrapped.to_base64();
    let restored = WrappedKey::from_base64(&stored).unwrap();

    let back = unwrap(&restored, &kek, KeyAlgorithm::Aes).unwrap();
    assert_eq!(back.material.expose(), data_key.expose());
}

#[test]
fn secrets_are_reproducible_from_alias_alone() {
    let kek = derive_kek(&[0x42u8; 256], 5, 256).unwrap();

    let first = password_with_entropy("jks-password", &kek, 512, None).unwrap();
    // a fresh KEK from the same pool contents and stamp
    let again = derive_kek(&[0x42u8; 256], 5, 256).unwrap();
    let second = password_with_entropy("jks-password", &again, 512, None).unwrap();

    assert_eq!(first.as_str(), second.as_str());
    assert_eq!(first.len(), 86);
}

#[test]
fn aes_128_kek_wraps_too() {
    let kek = derive_kek(&[7u8; 64], 0, 128).unwrap();
    let key = [0xEEu8; 32];
    let wrapped = wrap(&key, &kek).unwrap();
    let back = unwrap(&wrapped, &kek, KeyAlgorithm::Aes).unwrap();
    assert_eq!(back.material.expose(), &key);
}
