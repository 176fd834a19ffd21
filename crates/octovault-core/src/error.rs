use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Problems with the caller's request, detected before any pipeline step runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("no files selected")]
    NoFiles,

    #[error("no password provided")]
    NoPassword,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("file name must not be empty")]
    EmptyFileName,

    #[error("file name must not contain directories: {0}")]
    InvalidFileName(String),
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("failed to compress image {name}: {reason}")]
    Normalization { name: String, reason: String },

    #[error("duplicate file name in archive: {0}")]
    DuplicateName(String),

    #[error("invalid password or corrupted file (entry: {entry})")]
    InvalidPasswordOrCorrupt { entry: String },

    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("another pipeline is already running")]
    Busy,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VaultError {
    /// True for the wrong-password family, as opposed to a structurally broken artifact.
    pub fn is_wrong_password(&self) -> bool {
        matches!(self, VaultError::InvalidPasswordOrCorrupt { .. })
    }
}
