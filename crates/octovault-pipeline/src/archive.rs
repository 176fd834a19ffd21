//! Archive container: an ordered name → token mapping.
//!
//! Serialized as self-describing JSON:
//! ```json
//! {"format":"octovault-archive","version":1,"entries":[{"name":"a.txt","token":"AQAA..."}]}
//! ```
//! Entry order is the order the files were handed to the encryptor.

use octovault_core::{CipherToken, InputError, VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const ARCHIVE_FORMAT: &str = "octovault-archive";
pub const ARCHIVE_VERSION: u32 = 1;

/// One sealed file inside an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub token: CipherToken,
}

#[derive(Debug, Serialize, Deserialize)]
struct Container {
    format: String,
    version: u32,
    entries: Vec<ArchiveEntry>,
}

/// An entry name is a bare file name: non-empty, no path separators, not `.` or `..`.
pub fn check_entry_name(name: &str) -> Result<(), InputError> {
    if name.is_empty() {
        return Err(InputError::EmptyFileName);
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(InputError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// Serialize entries into one container. Names must be bare file names and unique.
pub fn pack(entries: &[ArchiveEntry]) -> VaultResult<Vec<u8>> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        check_entry_name(&entry.name)?;
        if !seen.insert(entry.name.as_str()) {
            return Err(VaultError::DuplicateName(entry.name.clone()));
        }
    }

    let container = Container {
        format: ARCHIVE_FORMAT.to_string(),
        version: ARCHIVE_VERSION,
        entries: entries.to_vec(),
    };
    serde_json::to_vec(&container)
        .map_err(|e| VaultError::Other(anyhow::anyhow!("archive serialization: {e}")))
}

/// Parse a container produced by [`pack`].
pub fn unpack(data: &[u8]) -> VaultResult<Vec<ArchiveEntry>> {
    let container: Container = serde_json::from_slice(data)
        .map_err(|e| VaultError::MalformedArchive(format!("not an archive container: {e}")))?;

    if container.format != ARCHIVE_FORMAT {
        return Err(VaultError::MalformedArchive(format!(
            "unknown container format '{}'",
            container.format
        )));
    }
    if container.version != ARCHIVE_VERSION {
        return Err(VaultError::MalformedArchive(format!(
            "unsupported archive version {}",
            container.version
        )));
    }
    if container.entries.is_empty() {
        return Err(VaultError::MalformedArchive("archive has no entries".into()));
    }

    let mut seen = HashSet::with_capacity(container.entries.len());
    for entry in &container.entries {
        if let Err(e) = check_entry_name(&entry.name) {
            return Err(VaultError::MalformedArchive(format!("bad entry name: {e}")));
        }
        if !seen.insert(entry.name.as_str()) {
            return Err(VaultError::MalformedArchive(format!(
                "repeated entry name '{}'",
                entry.name
            )));
        }
    }

    Ok(container.entries)
}
