use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// File extension every artifact is saved under.
pub const ARTIFACT_EXTENSION: &str = "octovault";

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "ico",
];

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "csv", "json", "xml", "log", "html", "css", "js", "ts", "tsx", "jsx",
];

/// Broad content class of a file, used to pick preprocessing and scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Text,
    Binary,
}

impl MediaKind {
    /// Guess the kind from a file name's extension (case-insensitive).
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Text
        } else {
            MediaKind::Binary
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Text => "text",
            MediaKind::Binary => "binary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaKind::Image),
            "text" => Some(MediaKind::Text),
            "binary" => Some(MediaKind::Binary),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named byte source handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub bytes: Vec<u8>,
    pub media_kind: MediaKind,
}

impl FileEntry {
    /// Build an entry, inferring the media kind from the name.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let media_kind = MediaKind::from_name(&name);
        Self {
            name,
            bytes: bytes.into(),
            media_kind,
        }
    }

    pub fn with_kind(name: impl Into<String>, bytes: impl Into<Vec<u8>>, media_kind: MediaKind) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            media_kind,
        }
    }
}

/// How the archive is packaged into the final artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionMode {
    #[default]
    Standard,
    /// Hide the archive inside a carrier file. Not implemented: packaged as `Standard`.
    Steganography,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionSettings {
    pub smart_compression: bool,
    pub mode: EncryptionMode,
    pub log_proof: bool,
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            smart_compression: true,
            mode: EncryptionMode::Standard,
            log_proof: false,
        }
    }
}

/// Opaque, self-contained ciphertext for one payload (base64 text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CipherToken(String);

impl CipherToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The single packaged, encrypted file exchanged with the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Name an artifact `<stem>.octovault`.
    pub fn new(stem: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{stem}.{ARTIFACT_EXTENSION}"),
            bytes,
        }
    }
}

/// SHA-256 digest of an artifact, shown as 64 lowercase hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> anyhow::Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| anyhow::anyhow!("invalid content hash '{s}': {e}"))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

/// A content hash timestamped on an external ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRecord {
    pub hash: ContentHash,
    pub tx_reference: String,
}
