//! RFC 3394 §4: AES key wrap Known-Answer Test vectors.
//!
//! Runs the published vectors through [`wrap`]/[`unwrap`] so the KEK size
//! dispatch is covered for all three AES sizes.

use data_encoding::HEXUPPER;
use strongbox_crypto_core::keywrap::{unwrap, wrap, KeyAlgorithm, WrappedKey};
use strongbox_crypto_core::Kek;

const KEY_DATA_128: &str = "00112233445566778899AABBCCDDEEFF";

fn hex(s: &str) -> Vec<u8> {
    HEXUPPER.decode(s.as_bytes()).unwrap()
}

fn kek_of(len: usize) -> Kek {
    let bytes: Vec<u8> = (0..len).map(|i| u8::try_from(i).unwrap()).collect();
    Kek::from_bytes(&bytes).unwrap()
}

fn check(kek: &Kek, key: &str, expected: &str, algorithm: KeyAlgorithm) {
    let wrapped = wrap(&hex(key), kek).unwrap();
    assert_eq!(HEXUPPER.encode(wrapped.as_bytes()), expected);

    let back = unwrap(&WrappedKey::from_bytes(&hex(expected)), kek, algorithm).unwrap();
    assert_eq!(back.material.expose(), hex(key).as_slice());
}

/// §4.1 Wrap 128 bits of key data with a 128-bit KEK.
#[test]
fn rfc3394_4_1_kek128_data128() {
    check(
        &kek_of(16),
        KEY_DATA_128,
        "1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5",
        KeyAlgorithm::Aes,
    );
}

/// §4.2 Wrap 128 bits of key data with a 192-bit KEK.
#[test]
fn rfc3394_4_2_kek192_data128() {
    check(
        &kek_of(24),
        KEY_DATA_128,
        "96778B25AE6CA435F92B5B97C050AED2468AB8A17AD84E5D",
        KeyAlgorithm::Aes,
    );
}

/// §4.3 Wrap 128 bits of key data with a 256-bit KEK.
#[test]
fn rfc3394_4_3_kek256_data128() {
    check(
        &kek_of(32),
        KEY_DATA_128,
        "64E8C3F9CE0F5BA263E9777905818A2A93C8191E7D6E8AE7",
        KeyAlgorithm::Aes,
    );
}

/// §4.6 Wrap 256 bits of key data with a 256-bit KEK.
#[test]
fn rfc3394_4_6_kek256_data256() {
    check(
        &kek_of(32),
        "00112233445566778899AABBCCDDEEFF000102030405060708090A0B0C0D0E0F",
        "28C9F404C4B810F4CBCCB35CFB87F8263F5786E2D80ED326CBC7F0E71A99F43BFB988B9B7A02DD21",
        KeyAlgorithm::Aes,
    );
}

/// Flipping one bit of a published ciphertext must trip the integrity check.
#[test]
fn rfc3394_vector_bit_flip_rejected() {
    let mut bytes = hex("64E8C3F9CE0F5BA263E9777905818A2A93C8191E7D6E8AE7");
    bytes[10] ^= 0x01;
    let result = unwrap(&WrappedKey::from_bytes(&bytes), &kek_of(32), KeyAlgorithm::Aes);
    assert!(result.is_err());
}
