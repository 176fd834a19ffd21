//! Passphrase-sealed payload tokens (Argon2id + XChaCha20-Poly1305)
//!
//! Token format (binary, then standard base64):
//! ```text
//! [1 byte: version = 1]
//! [4 bytes: Argon2 mem_cost_kib, BE][4 bytes: time_cost, BE][4 bytes: parallelism, BE]
//! [16 bytes: random salt]
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! AAD = the 29-byte header (version || params || salt)
//! ```
//!
//! Binding the header as AAD means a token whose KDF parameters or salt were
//! edited fails authentication instead of deriving a different key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use octovault_core::CipherToken;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::kdf::{derive_key, KdfParams};
use crate::{NONCE_SIZE, SALT_SIZE, TAG_SIZE};

/// Current token layout version.
pub const TOKEN_VERSION: u8 = 1;

/// version (1) + three u32 KDF params (12) + salt (16)
pub const HEADER_SIZE: usize = 1 + 12 + SALT_SIZE;

/// Encrypts payloads under a passphrase, one self-contained token each.
#[derive(Debug, Clone, Default)]
pub struct PassphraseCipher {
    params: KdfParams,
}

impl PassphraseCipher {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Seal `plaintext` under `password`.
    ///
    /// A fresh salt and nonce are drawn for every call, so sealing the same
    /// plaintext twice never produces the same token. An empty password is
    /// refused outright.
    pub fn encrypt(&self, plaintext: &[u8], password: &SecretString) -> anyhow::Result<CipherToken> {
        if password.expose_secret().is_empty() {
            anyhow::bail!("refusing to encrypt with an empty password");
        }

        let mut salt = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);
        let key = derive_key(password, &salt, &self.params)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let header = build_header(&self.params, &salt);
        let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: &header,
                },
            )
            .map_err(|e| anyhow::anyhow!("payload encryption failed: {e}"))?;

        let mut token = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + ciphertext.len());
        token.extend_from_slice(&header);
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);

        Ok(CipherToken::new(STANDARD.encode(token)))
    }

    /// Open `token` with `password`.
    ///
    /// Never fails: a wrong password, a tampered or truncated token, or
    /// out-of-bounds KDF parameters all yield an empty vector. The caller
    /// decides what an unusable payload means.
    pub fn decrypt(&self, token: &CipherToken, password: &SecretString) -> Vec<u8> {
        match open_token(token, password) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                debug!(error = %e, "token did not open");
                Vec::new()
            }
        }
    }
}

fn open_token(token: &CipherToken, password: &SecretString) -> anyhow::Result<Vec<u8>> {
    let raw = STANDARD
        .decode(token.as_str())
        .map_err(|e| anyhow::anyhow!("token is not base64: {e}"))?;

    if raw.len() < HEADER_SIZE + NONCE_SIZE + TAG_SIZE {
        anyhow::bail!(
            "token too short: {} bytes (minimum {})",
            raw.len(),
            HEADER_SIZE + NONCE_SIZE + TAG_SIZE
        );
    }

    let (header, rest) = raw.split_at(HEADER_SIZE);
    let (params, salt) = parse_header(header)?;
    if !params.within_bounds() {
        anyhow::bail!("token KDF parameters out of bounds: {params:?}");
    }
    if password.expose_secret().is_empty() {
        anyhow::bail!("empty password");
    }

    let key = derive_key(password, &salt, &params)?;
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| anyhow::anyhow!("authentication failed: wrong password or corrupted token"))
}

/// Build header: version || mem_cost || time_cost || parallelism || salt
fn build_header(params: &KdfParams, salt: &[u8; SALT_SIZE]) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0] = TOKEN_VERSION;
    header[1..5].copy_from_slice(&params.mem_cost_kib.to_be_bytes());
    header[5..9].copy_from_slice(&params.time_cost.to_be_bytes());
    header[9..13].copy_from_slice(&params.parallelism.to_be_bytes());
    header[13..].copy_from_slice(salt);
    header
}

fn parse_header(header: &[u8]) -> anyhow::Result<(KdfParams, [u8; SALT_SIZE])> {
    if header[0] != TOKEN_VERSION {
        anyhow::bail!("unsupported token version {}", header[0]);
    }

    let read_u32 = |range: std::ops::Range<usize>| -> anyhow::Result<u32> {
        let bytes: [u8; 4] = header[range]
            .try_into()
            .map_err(|_| anyhow::anyhow!("truncated token header"))?;
        Ok(u32::from_be_bytes(bytes))
    };

    let params = KdfParams {
        mem_cost_kib: read_u32(1..5)?,
        time_cost: read_u32(5..9)?,
        parallelism: read_u32(9..13)?,
    };

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&header[13..HEADER_SIZE]);
    Ok((params, salt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> PassphraseCipher {
        PassphraseCipher::new(KdfParams {
            mem_cost_kib: 256,
            time_cost: 1,
            parallelism: 1,
        })
    }

    fn password(s: &str) -> SecretString {
        SecretString::from(s)
    }

    fn raw(token: &CipherToken) -> Vec<u8> {
        STANDARD.decode(token.as_str()).unwrap()
    }

    fn token_from_raw(raw: &[u8]) -> CipherToken {
        CipherToken::new(STANDARD.encode(raw))
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = test_cipher();
        let plaintext = b"hello, encrypted world!";

        let token = cipher.encrypt(plaintext, &password("Secr3t!")).unwrap();
        let decrypted = cipher.decrypt(&token, &password("Secr3t!"));

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty_plaintext() {
        let cipher = test_cipher();
        let token = cipher.encrypt(b"", &password("pw")).unwrap();
        assert_eq!(cipher.decrypt(&token, &password("pw")), b"");
    }

    #[test]
    fn test_tokens_are_not_deterministic() {
        let cipher = test_cipher();
        let t1 = cipher.encrypt(b"same", &password("pw")).unwrap();
        let t2 = cipher.encrypt(b"same", &password("pw")).unwrap();

        assert_ne!(t1, t2, "salt and nonce must differ per token");
        assert_eq!(cipher.decrypt(&t1, &password("pw")), b"same");
        assert_eq!(cipher.decrypt(&t2, &password("pw")), b"same");
    }

    #[test]
    fn test_wrong_password_yields_empty() {
        let cipher = test_cipher();
        let token = cipher.encrypt(b"secret data", &password("right")).unwrap();

        assert!(cipher.decrypt(&token, &password("wrong")).is_empty());
    }

    #[test]
    fn test_empty_password_refused() {
        let cipher = test_cipher();
        assert!(cipher.encrypt(b"data", &password("")).is_err());
    }

    #[test]
    fn test_token_size() {
        let cipher = test_cipher();
        let token = cipher.encrypt(&[0u8; 1000], &password("pw")).unwrap();

        // header (29) + nonce (24) + plaintext (1000) + tag (16)
        assert_eq!(raw(&token).len(), HEADER_SIZE + 24 + 1000 + 16);
    }

    #[test]
    fn test_token_carries_params() {
        let cipher = test_cipher();
        let token = cipher.encrypt(b"x", &password("pw")).unwrap();
        let (params, _) = parse_header(&raw(&token)[..HEADER_SIZE]).unwrap();
        assert_eq!(&params, cipher.params());
    }

    #[test]
    fn test_tampered_ciphertext_yields_empty() {
        let cipher = test_cipher();
        let token = cipher.encrypt(b"secret data", &password("pw")).unwrap();

        let mut bytes = raw(&token);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        assert!(cipher.decrypt(&token_from_raw(&bytes), &password("pw")).is_empty());
    }

    #[test]
    fn test_tampered_salt_yields_empty() {
        let cipher = test_cipher();
        let token = cipher.encrypt(b"secret data", &password("pw")).unwrap();

        let mut bytes = raw(&token);
        bytes[HEADER_SIZE - 1] ^= 0x01;

        assert!(cipher.decrypt(&token_from_raw(&bytes), &password("pw")).is_empty());
    }

    #[test]
    fn test_oversized_kdf_params_refused() {
        let cipher = test_cipher();
        let token = cipher.encrypt(b"secret data", &password("pw")).unwrap();

        let mut bytes = raw(&token);
        bytes[1..5].copy_from_slice(&u32::MAX.to_be_bytes());

        assert!(cipher.decrypt(&token_from_raw(&bytes), &password("pw")).is_empty());
    }

    #[test]
    fn test_garbage_tokens_yield_empty() {
        let cipher = test_cipher();
        let pw = password("pw");

        assert!(cipher.decrypt(&CipherToken::new("not base64 !!".into()), &pw).is_empty());
        assert!(cipher.decrypt(&CipherToken::new(String::new()), &pw).is_empty());
        assert!(cipher.decrypt(&token_from_raw(&[TOKEN_VERSION; 40]), &pw).is_empty());
    }

    #[test]
    fn test_unknown_version_yields_empty() {
        let cipher = test_cipher();
        let token = cipher.encrypt(b"secret data", &password("pw")).unwrap();

        let mut bytes = raw(&token);
        bytes[0] = 99;

        assert!(cipher.decrypt(&token_from_raw(&bytes), &password("pw")).is_empty());
    }
}
