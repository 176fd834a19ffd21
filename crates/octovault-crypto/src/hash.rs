//! SHA-256 content hashing for artifacts
//!
//! The digest is taken over the artifact bytes exactly as delivered (the
//! base64 text), so anyone holding the file can reproduce it.

use anyhow::{Context, Result};
use octovault_core::ContentHash;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hash a byte slice in memory.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    ContentHash::from_bytes(Sha256::digest(data).into())
}

/// Hash a file from disk.
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    let data = std::fs::read(path)
        .with_context(|| format!("reading file for hashing: {}", path.display()))?;
    Ok(hash_bytes(&data))
}
