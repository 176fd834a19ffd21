//! Request validation and password strength.

use octovault_core::{FileEntry, InputError, VaultError, VaultResult};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::fmt;

use crate::archive::check_entry_name;

/// Coarse password strength label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLabel {
    Weak,
    Medium,
    Strong,
}

impl fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrengthLabel::Weak => "Weak",
            StrengthLabel::Medium => "Medium",
            StrengthLabel::Strong => "Strong",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strength {
    /// 0..=5
    pub score: u8,
    pub label: StrengthLabel,
}

/// Score a password: one point each for length >= 8, length >= 12, mixed
/// case, a digit, and a non-alphanumeric character.
pub fn password_strength(password: &str) -> Strength {
    let len = password.chars().count();
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    let score = [len >= 8, len >= 12, has_lower && has_upper, has_digit, has_symbol]
        .into_iter()
        .filter(|&hit| hit)
        .count() as u8;

    let label = match score {
        0..=1 => StrengthLabel::Weak,
        2..=3 => StrengthLabel::Medium,
        _ => StrengthLabel::Strong,
    };

    Strength { score, label }
}

/// Check that the confirmation matches the password.
pub fn confirm_password(password: &SecretString, confirmation: &SecretString) -> Result<(), InputError> {
    if password.expose_secret() != confirmation.expose_secret() {
        return Err(InputError::PasswordMismatch);
    }
    Ok(())
}

/// Reject an encryption request before any work is done.
///
/// Names are checked here with the same rules the archive applies, so a bad
/// or repeated name fails before any image is normalized or key derived.
pub fn validate_encrypt_request(files: &[FileEntry], password: &SecretString) -> VaultResult<()> {
    if files.is_empty() {
        return Err(InputError::NoFiles.into());
    }
    validate_password(password)?;

    let mut seen = HashSet::with_capacity(files.len());
    for file in files {
        check_entry_name(&file.name)?;
        if !seen.insert(file.name.as_str()) {
            return Err(VaultError::DuplicateName(file.name.clone()));
        }
    }
    Ok(())
}

pub fn validate_password(password: &SecretString) -> Result<(), InputError> {
    if password.expose_secret().is_empty() {
        return Err(InputError::NoPassword);
    }
    Ok(())
}
