//! Transport-safe text encoding
//!
//! Two forms are used:
//! - plain standard base64, for the finished artifact;
//! - a payload envelope `"<media kind>;base64,<data>"` for each file before it
//!   is sealed. The envelope is never empty (so a zero-length file is still
//!   distinguishable from an unopened token) and carries the media kind back
//!   to the reader.
//!
//! [`decode_payload`] is the one place where "the token opened to something
//! usable" is decided.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use octovault_core::MediaKind;
use thiserror::Error;

const ENVELOPE_MARKER: &str = ";base64,";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,

    #[error("payload is not UTF-8 text")]
    NotText,

    #[error("payload is missing its envelope")]
    MissingEnvelope,

    #[error("unknown media kind '{0}'")]
    UnknownKind(String),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Encode bytes as standard base64.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode standard base64, ignoring surrounding ASCII whitespace.
pub fn decode(text: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let trimmed = text.trim_ascii();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(STANDARD.decode(trimmed)?)
}

/// Wrap file bytes in the payload envelope.
pub fn encode_payload(kind: MediaKind, data: &[u8]) -> String {
    format!("{}{ENVELOPE_MARKER}{}", kind.as_str(), STANDARD.encode(data))
}

/// Unwrap a decrypted payload back into its media kind and raw bytes.
pub fn decode_payload(payload: &[u8]) -> Result<(MediaKind, Vec<u8>), DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotText)?;
    let (kind, data) = text
        .split_once(ENVELOPE_MARKER)
        .ok_or(DecodeError::MissingEnvelope)?;
    let kind = MediaKind::parse(kind).ok_or_else(|| DecodeError::UnknownKind(kind.to_string()))?;
    Ok((kind, STANDARD.decode(data)?))
}
