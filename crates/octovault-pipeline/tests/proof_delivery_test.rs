//! Integration tests for the soft proof step and fatal delivery failures.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use octovault_core::{ContentHash, EncryptionSettings, FileEntry, VaultError};
use octovault_crypto::KdfParams;
use octovault_pipeline::proof::memo_for;
use octovault_pipeline::{
    DeliverySink, MemorySink, Pipeline, PipelineState, ProofError, ProofLedger, Session,
};
use secrecy::SecretString;

const FAST: KdfParams = KdfParams {
    mem_cost_kib: 256,
    time_cost: 1,
    parallelism: 1,
};

struct FakeLedger {
    identity: Option<String>,
    result: Result<String, ProofError>,
    submitted: Mutex<Vec<(ContentHash, String)>>,
}

impl FakeLedger {
    fn new(identity: Option<&str>, result: Result<String, ProofError>) -> Arc<Self> {
        Arc::new(Self {
            identity: identity.map(str::to_string),
            result,
            submitted: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ProofLedger for FakeLedger {
    fn identity(&self) -> Option<String> {
        self.identity.clone()
    }

    async fn submit(&self, hash: &ContentHash, memo: &str) -> Result<String, ProofError> {
        self.submitted
            .lock()
            .unwrap()
            .push((*hash, memo.to_string()));
        self.result.clone()
    }
}

struct FailingSink;

#[async_trait]
impl DeliverySink for FailingSink {
    async fn deliver(&self, _name: &str, _bytes: &[u8]) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

fn with_proof() -> EncryptionSettings {
    EncryptionSettings {
        log_proof: true,
        ..EncryptionSettings::default()
    }
}

fn files() -> Vec<FileEntry> {
    vec![FileEntry::new("a.txt", b"hello-1234".to_vec())]
}

#[tokio::test]
async fn proof_is_logged_with_memo() {
    let ledger = FakeLedger::new(Some("wallet-1"), Ok("tx-42".into()));
    let pipeline = Pipeline::new(Arc::new(MemorySink::new()))
        .with_kdf_params(FAST)
        .with_ledger(ledger.clone());

    let outcome = pipeline
        .encrypt(&files(), &SecretString::from("pw"), &with_proof(), None)
        .await
        .unwrap();

    let proof = outcome.proof.expect("proof recorded");
    assert_eq!(proof.hash, outcome.hash);
    assert_eq!(proof.tx_reference, "tx-42");
    assert!(outcome.warnings.is_empty());

    let submitted = ledger.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0], (outcome.hash, memo_for(&outcome.hash)));
}

#[tokio::test]
async fn proof_failure_is_only_a_warning() {
    let ledger = FakeLedger::new(
        Some("wallet-1"),
        Err(ProofError::Connectivity("timeout".into())),
    );
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::new(sink.clone())
        .with_kdf_params(FAST)
        .with_ledger(ledger);

    let outcome = pipeline
        .encrypt(&files(), &SecretString::from("pw"), &with_proof(), None)
        .await
        .unwrap();

    assert!(outcome.proof.is_none());
    assert_eq!(
        outcome.warnings,
        vec![ProofError::Connectivity("timeout".into())]
    );
    assert_eq!(sink.delivered().len(), 1, "artifact still delivered");
}

#[tokio::test]
async fn proof_without_identity_warns() {
    let sink = Arc::new(MemorySink::new());

    // No ledger at all
    let pipeline = Pipeline::new(sink.clone()).with_kdf_params(FAST);
    let outcome = pipeline
        .encrypt(&files(), &SecretString::from("pw"), &with_proof(), None)
        .await
        .unwrap();
    assert!(outcome.proof.is_none());
    assert_eq!(outcome.warnings, vec![ProofError::NoIdentity]);

    // Ledger that is not connected
    let ledger = FakeLedger::new(None, Ok("never".into()));
    let pipeline = Pipeline::new(sink.clone())
        .with_kdf_params(FAST)
        .with_ledger(ledger.clone());
    let outcome = pipeline
        .encrypt(&files(), &SecretString::from("pw"), &with_proof(), None)
        .await
        .unwrap();
    assert_eq!(outcome.warnings, vec![ProofError::NoIdentity]);
    assert!(ledger.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn proof_not_requested_is_not_submitted() {
    let ledger = FakeLedger::new(Some("wallet-1"), Ok("tx".into()));
    let pipeline = Pipeline::new(Arc::new(MemorySink::new()))
        .with_kdf_params(FAST)
        .with_ledger(ledger.clone());

    let outcome = pipeline
        .encrypt(
            &files(),
            &SecretString::from("pw"),
            &EncryptionSettings::default(),
            None,
        )
        .await
        .unwrap();

    assert!(outcome.proof.is_none());
    assert!(outcome.warnings.is_empty());
    assert!(ledger.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sink_failure_fails_encryption() {
    let pipeline = Pipeline::new(Arc::new(FailingSink)).with_kdf_params(FAST);

    let err = pipeline
        .encrypt(
            &files(),
            &SecretString::from("pw"),
            &EncryptionSettings::default(),
            None,
        )
        .await
        .unwrap_err();

    match err {
        VaultError::Delivery(reason) => assert!(reason.contains("disk full"), "{reason}"),
        other => panic!("expected Delivery, got {other:?}"),
    }
}

#[tokio::test]
async fn session_tracks_a_failed_run() {
    let session = Session::new();
    let pipeline = Pipeline::new(Arc::new(MemorySink::new())).with_kdf_params(FAST);

    let run = session.begin().unwrap();
    assert!(matches!(session.begin(), Err(VaultError::Busy)));

    let result = pipeline
        .encrypt(&[], &SecretString::from("pw"), &EncryptionSettings::default(), None)
        .await;
    assert!(result.is_err());
    drop(run);
    assert_eq!(session.state(), PipelineState::Failed);

    let run = session.begin().unwrap();
    pipeline
        .encrypt(&files(), &SecretString::from("pw"), &EncryptionSettings::default(), None)
        .await
        .unwrap();
    run.succeed();
    assert_eq!(session.state(), PipelineState::Succeeded);
}
