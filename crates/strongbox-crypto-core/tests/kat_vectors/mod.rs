mod aes_kw;
mod pbkdf2_sha512;
mod secret_derivation;
