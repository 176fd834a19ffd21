//! Delivery of finished bytes to the user: the artifact after encryption,
//! each recovered file after decryption.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes each delivery as a file inside one directory.
///
/// Only the final path component of `name` is used, so archive entry names
/// can never escape the directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where `name` would be written, or `None` if it has no file-name component.
    pub fn target_path(&self, name: &str) -> Option<PathBuf> {
        let file_name = Path::new(name).file_name()?;
        Some(self.dir.join(file_name))
    }
}

#[async_trait]
impl DeliverySink for DirectorySink {
    async fn deliver(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self
            .target_path(name)
            .with_context(|| format!("unusable file name: {name:?}"))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating dir: {}", self.dir.display()))?;

        // Atomic write
        let tmp = path.with_extension("octovault_tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing tmp: {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("renaming to: {}", path.display()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "delivered");
        Ok(())
    }
}

/// Keeps deliveries in memory, in order. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far
    pub fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DeliverySink for MemorySink {
    async fn deliver(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.delivered
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?
            .push((name.to_string(), bytes.to_vec()));
        Ok(())
    }
}
