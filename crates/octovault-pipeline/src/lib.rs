//! octovault-pipeline: encrypt and decrypt pipelines with image normalization,
//! archive packing, ledger proof and sensitive-data scanning hooks

pub mod archive;
pub mod engine;
pub mod input;
pub mod normalize;
pub mod proof;
pub mod scan;
pub mod session;
pub mod sink;

pub use engine::{EncryptOutcome, Pipeline, ProgressFn};
pub use normalize::ImageNormalizer;
pub use proof::{ProofError, ProofLedger};
pub use scan::{scan_recovered, PatternScanner, PiiItem, ScanError, ScanReport, TextScanner};
pub use session::{PipelineState, Session};
pub use sink::{DeliverySink, DirectorySink, MemorySink};
