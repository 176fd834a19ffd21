//! octovault-crypto: passphrase encryption for OctoVault artifacts
//!
//! Every payload is sealed independently:
//!
//! ```text
//! passphrase ──Argon2id(random salt)──▶ 256-bit key
//! payload ──XChaCha20-Poly1305(random nonce, AAD = token header)──▶ CipherToken
//! ```
//!
//! A token carries its own KDF parameters, salt and nonce, so it can be
//! opened with nothing but the passphrase. Opening never fails loudly: a
//! wrong passphrase or a damaged token yields empty output, and callers
//! detect that at the transport decode boundary (`transport::decode_payload`).

pub mod cipher;
pub mod hash;
pub mod kdf;
pub mod transport;

pub use cipher::PassphraseCipher;
pub use hash::{hash_bytes, hash_file};
pub use kdf::{derive_key, DerivedKey, KdfParams};
pub use transport::DecodeError;

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of the random Argon2id salt stored in each token
pub const SALT_SIZE: usize = 16;
