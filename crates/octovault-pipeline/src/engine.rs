//! Encryption and decryption pipelines.
//!
//! Encrypt:
//!   validate → normalize images → envelope → seal per file → pack →
//!   base64 → SHA-256 → optional ledger proof → deliver artifact
//!
//! Decrypt:
//!   base64 → unpack → open each token → decode envelope → deliver files
//!
//! Files are processed strictly in input order; every step is awaited before
//! the next one starts.

use octovault_core::{
    Artifact, ContentHash, EncryptionMode, EncryptionSettings, FileEntry, MediaKind,
    ProofRecord, VaultError, VaultResult,
};
use octovault_crypto::{hash_bytes, transport, KdfParams, PassphraseCipher};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::archive::{self, ArchiveEntry};
use crate::input::{validate_encrypt_request, validate_password};
use crate::normalize::ImageNormalizer;
use crate::proof::{log_proof, ProofError, ProofLedger};
use crate::sink::DeliverySink;

/// Progress callback type (files_done, files_total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Default artifact file stem
pub const DEFAULT_ARTIFACT_STEM: &str = "encrypted";

/// Result of a successful encryption
#[derive(Debug)]
pub struct EncryptOutcome {
    pub artifact: Artifact,
    pub hash: ContentHash,
    /// Present only when a proof was requested and the ledger accepted it
    pub proof: Option<ProofRecord>,
    /// Soft failures that did not stop the encryption
    pub warnings: Vec<ProofError>,
}

/// The two pipelines plus their collaborators.
pub struct Pipeline {
    cipher: PassphraseCipher,
    normalizer: ImageNormalizer,
    ledger: Option<Arc<dyn ProofLedger>>,
    sink: Arc<dyn DeliverySink>,
    artifact_stem: String,
}

impl Pipeline {
    pub fn new(sink: Arc<dyn DeliverySink>) -> Self {
        Self {
            cipher: PassphraseCipher::default(),
            normalizer: ImageNormalizer::default(),
            ledger: None,
            sink,
            artifact_stem: DEFAULT_ARTIFACT_STEM.to_string(),
        }
    }

    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.cipher = PassphraseCipher::new(params);
        self
    }

    pub fn with_normalizer(mut self, normalizer: ImageNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn ProofLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_artifact_stem(mut self, stem: impl Into<String>) -> Self {
        self.artifact_stem = stem.into();
        self
    }

    /// Bundle `files` into one password-protected artifact and deliver it.
    pub async fn encrypt(
        &self,
        files: &[FileEntry],
        password: &SecretString,
        settings: &EncryptionSettings,
        progress: Option<&ProgressFn>,
    ) -> VaultResult<EncryptOutcome> {
        validate_encrypt_request(files, password)?;

        match settings.mode {
            EncryptionMode::Standard => {}
            EncryptionMode::Steganography => {
                warn!("steganography mode has no separate format; using the standard pipeline");
            }
        }

        let total = files.len() as u64;
        let mut entries = Vec::with_capacity(files.len());

        for (i, file) in files.iter().enumerate() {
            let bytes = if settings.smart_compression && file.media_kind == MediaKind::Image {
                let normalized = self.normalizer.normalize(&file.name, &file.bytes)?;
                debug!(
                    name = %file.name,
                    before = file.bytes.len(),
                    after = normalized.len(),
                    "image normalized"
                );
                normalized
            } else {
                file.bytes.clone()
            };

            let envelope = transport::encode_payload(file.media_kind, &bytes);
            let token = self
                .cipher
                .encrypt(envelope.as_bytes(), password)
                .map_err(|e| VaultError::Cipher(format!("{}: {e}", file.name)))?;

            entries.push(ArchiveEntry {
                name: file.name.clone(),
                token,
            });

            if let Some(cb) = progress {
                cb(i as u64 + 1, total, &format!("sealed {}", file.name));
            }
        }

        let container = archive::pack(&entries)?;
        let artifact = Artifact::new(
            &self.artifact_stem,
            transport::encode(&container).into_bytes(),
        );
        let hash = hash_bytes(&artifact.bytes);

        let mut proof = None;
        let mut warnings = Vec::new();
        if settings.log_proof {
            match log_proof(self.ledger.as_deref(), &hash).await {
                Ok(record) => proof = Some(record),
                Err(e) => warnings.push(e),
            }
        }

        self.sink
            .deliver(&artifact.file_name, &artifact.bytes)
            .await
            .map_err(|e| VaultError::Delivery(format!("{}: {e:#}", artifact.file_name)))?;

        info!(
            files = files.len(),
            bytes = artifact.bytes.len(),
            %hash,
            proof = proof.is_some(),
            "artifact created"
        );

        Ok(EncryptOutcome {
            artifact,
            hash,
            proof,
            warnings,
        })
    }

    /// Open an artifact and deliver every recovered file.
    ///
    /// The first entry that fails to open aborts the whole run; nothing is
    /// delivered unless every entry opened.
    pub async fn decrypt(
        &self,
        artifact: &Artifact,
        password: &SecretString,
        progress: Option<&ProgressFn>,
    ) -> VaultResult<Vec<FileEntry>> {
        validate_password(password)?;

        let container = transport::decode(&artifact.bytes)
            .map_err(|e| VaultError::MalformedArchive(format!("artifact is not base64: {e}")))?;
        let entries = archive::unpack(&container)?;

        let total = entries.len() as u64;
        let mut files = Vec::with_capacity(entries.len());

        for (i, entry) in entries.into_iter().enumerate() {
            let payload = self.cipher.decrypt(&entry.token, password);
            let (media_kind, bytes) = transport::decode_payload(&payload).map_err(|e| {
                debug!(entry = %entry.name, error = %e, "entry did not open");
                VaultError::InvalidPasswordOrCorrupt {
                    entry: entry.name.clone(),
                }
            })?;

            if let Some(cb) = progress {
                cb(i as u64 + 1, total, &format!("opened {}", entry.name));
            }
            files.push(FileEntry::with_kind(entry.name, bytes, media_kind));
        }

        for file in &files {
            self.sink
                .deliver(&file.name, &file.bytes)
                .await
                .map_err(|e| VaultError::Delivery(format!("{}: {e:#}", file.name)))?;
        }

        info!(
            artifact = %artifact.file_name,
            files = files.len(),
            "artifact opened"
        );
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    const FAST: KdfParams = KdfParams {
        mem_cost_kib: 256,
        time_cost: 1,
        parallelism: 1,
    };

    fn plain() -> EncryptionSettings {
        EncryptionSettings {
            smart_compression: false,
            ..EncryptionSettings::default()
        }
    }

    #[tokio::test]
    async fn test_validation_runs_first() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = Pipeline::new(sink.clone()).with_kdf_params(FAST);

        let err = pipeline
            .encrypt(&[], &SecretString::from("pw"), &plain(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Input(octovault_core::InputError::NoFiles)));
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_fails_before_sealing() {
        let sink = Arc::new(MemorySink::new());
        // Default (expensive) KDF: a duplicate must be caught before any key is derived
        let pipeline = Pipeline::new(sink.clone());
        let sealed = Arc::new(std::sync::Mutex::new(0u64));
        let sealed_cb = sealed.clone();
        let cb: ProgressFn = Box::new(move |_, _, _| *sealed_cb.lock().unwrap() += 1);

        let files = vec![
            FileEntry::new("a.txt", b"1".to_vec()),
            FileEntry::new("a.txt", b"2".to_vec()),
        ];
        let err = pipeline
            .encrypt(&files, &SecretString::from("pw"), &plain(), Some(&cb))
            .await
            .unwrap_err();

        assert!(matches!(err, VaultError::DuplicateName(ref n) if n == "a.txt"));
        assert_eq!(*sealed.lock().unwrap(), 0);
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_artifact_name_uses_stem() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = Pipeline::new(sink.clone())
            .with_kdf_params(FAST)
            .with_artifact_stem("holiday");

        let outcome = pipeline
            .encrypt(
                &[FileEntry::new("a.txt", b"x".to_vec())],
                &SecretString::from("pw"),
                &plain(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.artifact.file_name, "holiday.octovault");
        assert_eq!(sink.delivered()[0].0, "holiday.octovault");
        assert_eq!(outcome.hash, hash_bytes(&outcome.artifact.bytes));
    }

    #[tokio::test]
    async fn test_progress_reports_each_file() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = Pipeline::new(sink).with_kdf_params(FAST);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let cb: ProgressFn = Box::new(move |done, total, _msg| {
            seen_cb.lock().unwrap().push((done, total));
        });

        let files = vec![
            FileEntry::new("a.txt", b"1".to_vec()),
            FileEntry::new("b.txt", b"2".to_vec()),
        ];
        pipeline
            .encrypt(&files, &SecretString::from("pw"), &plain(), Some(&cb))
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_decrypt_restores_media_kind() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = Pipeline::new(sink).with_kdf_params(FAST);
        let pw = SecretString::from("pw");

        let outcome = pipeline
            .encrypt(
                &[FileEntry::with_kind("blob", b"\x00\x01".to_vec(), MediaKind::Image)],
                &pw,
                &plain(),
                None,
            )
            .await
            .unwrap();
        let files = pipeline.decrypt(&outcome.artifact, &pw, None).await.unwrap();

        assert_eq!(files[0].media_kind, MediaKind::Image);
        assert_eq!(files[0].bytes, b"\x00\x01");
    }
}
