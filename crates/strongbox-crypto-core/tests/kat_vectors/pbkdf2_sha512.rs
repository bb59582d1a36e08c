//! PBKDF2-HMAC-SHA-512 Known-Answer Test.
//!
//! The derivation in `secret` is a thin call into the `pbkdf2` crate; this
//! pins that crate to the widely published single-iteration vector so a
//! dependency swap that changes output is caught.

use data_encoding::HEXLOWER;
use sha2::Sha512;

/// P = "password", S = "salt", c = 1, dkLen = 64.
#[test]
fn pbkdf2_hmac_sha512_one_iteration() {
    let mut out = [0u8; 64];
    pbkdf2::pbkdf2_hmac::<Sha512>(b"password", b"salt", 1, &mut out);
    assert_eq!(
        HEXLOWER.encode(&out),
        "867f70cf1ade02cff3752599a3a53dc4af34c7a669815ae5d513554e1c8cf252\
         c02d470a285a0501bad999bfe943c08f050235d7d68b1da55e63f73b60a57fce"
    );
}
