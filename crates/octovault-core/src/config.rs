use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{EncryptionMode, EncryptionSettings};

/// Top-level configuration (loaded from octovault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub crypto: CryptoConfig,
    pub compression: CompressionConfig,
    pub output: OutputConfig,
    pub proof: ProofConfig,
    pub scan: ScanConfig,
    pub log: LogConfig,
}

impl VaultConfig {
    /// Encryption settings implied by this config, before CLI overrides.
    pub fn encryption_settings(&self) -> EncryptionSettings {
        EncryptionSettings {
            smart_compression: self.compression.smart_compression,
            mode: EncryptionMode::Standard,
            log_proof: self.proof.log_proof,
        }
    }
}

/// Passphrase KDF configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Re-encode images before encryption (default: true)
    pub smart_compression: bool,
    /// Longest allowed image edge in pixels (default: 1920)
    pub max_dimension: u32,
    /// JPEG quality 1-100 (default: 80)
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory artifacts and recovered files are written to
    pub dir: PathBuf,
    /// Artifact file name without extension
    pub artifact_stem: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    /// Submit the artifact hash to the ledger after encryption
    pub log_proof: bool,
    /// Transaction explorer URL; `{tx}` is replaced by the reference
    pub explorer_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Scan recovered text files for sensitive data
    pub enabled: bool,
    /// Only the first `max_chars` characters of a file are scanned
    pub max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            argon2_mem_cost_kib: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            smart_compression: true,
            max_dimension: 1920,
            jpeg_quality: 80,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            artifact_stem: "encrypted".into(),
        }
    }
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            log_proof: false,
            explorer_url: "https://explorer.solana.com/tx/{tx}?cluster=devnet".into(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_chars: 10_000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}
