//! octovault-core: shared types, configuration schema and errors

pub mod config;
pub mod error;
pub mod types;

pub use error::{InputError, VaultError, VaultResult};
pub use types::{
    Artifact, CipherToken, ContentHash, EncryptionMode, EncryptionSettings, FileEntry, MediaKind,
    ProofRecord, ARTIFACT_EXTENSION,
};
