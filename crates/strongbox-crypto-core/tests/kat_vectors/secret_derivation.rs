//! Pinned outputs of alias-based secret derivation.
//!
//! Derived secrets are reconstructed, never stored, so these values must
//! not change between releases. Computed independently with
//! PBKDF2WithHmacSHA512, 1003 iterations, alias as UTF-8 password and KEK
//! bytes as salt.

use data_encoding::HEXLOWER;
use strongbox_crypto_core::{key_material, password, password_with_entropy, Kek};

const ALIAS: &str = "Check Request Key";

fn zero_kek() -> Kek {
    Kek::from_bytes(&[0u8; 32]).unwrap()
}

fn counting_kek() -> Kek {
    let bytes: Vec<u8> = (0u8..16).collect();
    Kek::from_bytes(&bytes).unwrap()
}

#[test]
fn key_material_zero_kek_256_bits() {
    let out = key_material(ALIAS, &zero_kek(), 256).unwrap();
    assert_eq!(
        HEXLOWER.encode(out.expose()),
        "7b3a9b07711f572732bd6afa57ab1da3ad9b0a0c65bc18f68ca23b60b052d7a6"
    );
}

#[test]
fn password_zero_kek_22_chars() {
    let pw = password(ALIAS, &zero_kek(), 22).unwrap();
    assert_eq!(pw.as_str(), "A949BBuazbf8lOfkPiP5No");
}

#[test]
fn password_by_entropy_matches_pinned_length() {
    // 128 bits need 22 characters.
    let pw = password_with_entropy(ALIAS, &zero_kek(), 128, None).unwrap();
    assert_eq!(pw.as_str(), "A949BBuazbf8lOfkPiP5No");
}

#[test]
fn non_ascii_alias_is_utf8_encoded() {
    let out = key_material("clé-ü", &counting_kek(), 128).unwrap();
    assert_eq!(HEXLOWER.encode(out.expose()), "d68c1e729c873f384a7a4c3a4a8dadbe");

    let pw = password("clé-ü", &counting_kek(), 10).unwrap();
    assert_eq!(pw.as_str(), "yZkwrYKVxH");
}
