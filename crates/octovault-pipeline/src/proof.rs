//! Ledger proof of an artifact hash.
//!
//! The ledger is an optional capability injected into the pipeline. Its
//! absence or failure is reported as a warning and never changes whether an
//! encryption succeeded.

use async_trait::async_trait;
use octovault_core::{ContentHash, ProofRecord};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("no ledger identity connected")]
    NoIdentity,

    #[error("ledger rejected the proof: {0}")]
    Rejected(String),

    #[error("ledger unreachable: {0}")]
    Connectivity(String),
}

/// An external ledger able to timestamp a content hash.
#[async_trait]
pub trait ProofLedger: Send + Sync {
    /// The identity (e.g. wallet address) submissions are signed with, if connected.
    fn identity(&self) -> Option<String>;

    /// Submit `memo` for `hash`; returns the transaction reference.
    async fn submit(&self, hash: &ContentHash, memo: &str) -> Result<String, ProofError>;
}

/// The memo text recorded on the ledger for `hash`.
pub fn memo_for(hash: &ContentHash) -> String {
    format!("OctoVault Hash: {hash}")
}

/// Fill a `{tx}` URL template with a transaction reference.
pub fn explorer_link(template: &str, tx_reference: &str) -> String {
    template.replace("{tx}", tx_reference)
}

/// Log `hash` on `ledger` if one is connected. Never fails the caller.
pub async fn log_proof(
    ledger: Option<&dyn ProofLedger>,
    hash: &ContentHash,
) -> Result<ProofRecord, ProofError> {
    let ledger = ledger.ok_or(ProofError::NoIdentity)?;
    let identity = ledger.identity().ok_or(ProofError::NoIdentity)?;

    match ledger.submit(hash, &memo_for(hash)).await {
        Ok(tx_reference) => {
            info!(%hash, identity = %identity, tx = %tx_reference, "proof logged");
            Ok(ProofRecord {
                hash: *hash,
                tx_reference,
            })
        }
        Err(e) => {
            warn!(%hash, error = %e, "proof logging failed");
            Err(e)
        }
    }
}
