//! Key derivation: Argon2id passphrase → per-token key

use argon2::{Algorithm, Argon2, Params, Version};
use octovault_core::config::CryptoConfig;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::{KEY_SIZE, SALT_SIZE};

/// Tokens asking for more than 1 GiB of Argon2 memory are refused.
pub const MAX_MEM_COST_KIB: u32 = 1024 * 1024;

/// Upper bound on iterations accepted from a token header.
pub const MAX_TIME_COST: u32 = 64;

/// Upper bound on lanes accepted from a token header.
pub const MAX_PARALLELISM: u32 = 64;

/// A 256-bit key derived from a passphrase via Argon2id.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id parameters for KDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl From<&CryptoConfig> for KdfParams {
    fn from(config: &CryptoConfig) -> Self {
        Self {
            mem_cost_kib: config.argon2_mem_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }
}

impl KdfParams {
    /// Whether these parameters are safe to honour when read from an untrusted token.
    pub fn within_bounds(&self) -> bool {
        (1..=MAX_MEM_COST_KIB).contains(&self.mem_cost_kib)
            && (1..=MAX_TIME_COST).contains(&self.time_cost)
            && (1..=MAX_PARALLELISM).contains(&self.parallelism)
    }
}

/// Derive a 256-bit key from a passphrase and salt using Argon2id.
///
/// The salt is random per token and stored in the token header (it does not
/// need to be secret).
pub fn derive_key(
    passphrase: &SecretString,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> anyhow::Result<DerivedKey> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| anyhow::anyhow!("invalid Argon2id params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase.expose_secret().as_bytes(), salt, &mut key)
        .map_err(|e| anyhow::anyhow!("Argon2id KDF failed: {e}"))?;

    Ok(DerivedKey::from_bytes(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    // Use fast params for testing
    const FAST: KdfParams = KdfParams {
        mem_cost_kib: 256,
        time_cost: 1,
        parallelism: 1,
    };

    #[test]
    fn test_kdf_deterministic() {
        let passphrase = SecretString::from("test-passphrase-123");
        let salt = [1u8; SALT_SIZE];

        let key1 = derive_key(&passphrase, &salt, &FAST).unwrap();
        let key2 = derive_key(&passphrase, &salt, &FAST).unwrap();

        assert_eq!(
            key1.as_bytes(),
            key2.as_bytes(),
            "KDF must be deterministic"
        );
    }

    #[test]
    fn test_kdf_different_passphrases() {
        let salt = [1u8; SALT_SIZE];

        let key1 = derive_key(&SecretString::from("passphrase-a"), &salt, &FAST).unwrap();
        let key2 = derive_key(&SecretString::from("passphrase-b"), &salt, &FAST).unwrap();

        assert_ne!(
            key1.as_bytes(),
            key2.as_bytes(),
            "different passphrases must produce different keys"
        );
    }

    #[test]
    fn test_kdf_different_salts() {
        let passphrase = SecretString::from("same-passphrase");

        let key1 = derive_key(&passphrase, &[1u8; SALT_SIZE], &FAST).unwrap();
        let key2 = derive_key(&passphrase, &[2u8; SALT_SIZE], &FAST).unwrap();

        assert_ne!(
            key1.as_bytes(),
            key2.as_bytes(),
            "different salts must produce different keys"
        );
    }

    #[test]
    fn test_invalid_params_rejected() {
        // Argon2 needs at least 8 KiB per lane
        let params = KdfParams {
            mem_cost_kib: 1,
            time_cost: 1,
            parallelism: 4,
        };
        let result = derive_key(&SecretString::from("pw"), &[0u8; SALT_SIZE], &params);
        assert!(result.is_err());
    }

    #[test]
    fn test_bounds() {
        assert!(KdfParams::default().within_bounds());
        assert!(FAST.within_bounds());
        assert!(!KdfParams { mem_cost_kib: MAX_MEM_COST_KIB + 1, ..FAST }.within_bounds());
        assert!(!KdfParams { time_cost: 0, ..FAST }.within_bounds());
        assert!(!KdfParams { parallelism: 0, ..FAST }.within_bounds());
    }

    #[test]
    fn test_params_from_config() {
        let config = CryptoConfig {
            argon2_mem_cost_kib: 2048,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        };
        let params = KdfParams::from(&config);
        assert_eq!(params.mem_cost_kib, 2048);
        assert_eq!(params.time_cost, 2);
        assert_eq!(params.parallelism, 1);
    }
}
