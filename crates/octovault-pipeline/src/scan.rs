//! Sensitive-data scanning of recovered text files.
//!
//! Scanning runs after decrypted files have been delivered; a scanner error
//! is reported per file and never touches the recovered data.

use async_trait::async_trait;
use octovault_core::{FileEntry, MediaKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, warn};

/// One detected piece of sensitive data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("scanner unavailable: {0}")]
    Unavailable(String),

    #[error("scanner rate limit exceeded")]
    RateLimited,

    #[error("invalid scanner response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait TextScanner: Send + Sync {
    async fn scan(&self, text: &str) -> Result<Vec<PiiItem>, ScanError>;
}

/// Outcome of scanning one recovered file
#[derive(Debug)]
pub struct ScanReport {
    pub name: String,
    /// True when only the first `max_chars` characters were sent
    pub truncated: bool,
    pub result: Result<Vec<PiiItem>, ScanError>,
}

/// Whether a file name looks like text worth scanning.
pub fn is_text_file(name: &str) -> bool {
    MediaKind::from_name(name) == MediaKind::Text
}

/// Scan every recovered text file, capping each payload at `max_chars`.
///
/// Non-text names, files that are not valid UTF-8 and empty payloads are skipped.
pub async fn scan_recovered(
    files: &[FileEntry],
    scanner: &dyn TextScanner,
    max_chars: usize,
) -> Vec<ScanReport> {
    let mut reports = Vec::new();

    for file in files.iter().filter(|f| is_text_file(&f.name)) {
        let Ok(text) = std::str::from_utf8(&file.bytes) else {
            debug!(name = %file.name, "skipping scan: not UTF-8");
            continue;
        };

        let (payload, truncated) = match text.char_indices().nth(max_chars) {
            Some((cut, _)) => (&text[..cut], true),
            None => (text, false),
        };
        if payload.is_empty() {
            debug!(name = %file.name, "skipping scan: nothing to send");
            continue;
        }

        let result = scanner.scan(payload).await;
        match &result {
            Ok(items) => debug!(name = %file.name, found = items.len(), "scan complete"),
            Err(e) => warn!(name = %file.name, error = %e, "scan failed"),
        }

        reports.push(ScanReport {
            name: file.name.clone(),
            truncated,
            result,
        });
    }

    reports
}

/// Local, regex-based scanner for common identifiers.
///
/// Detects email addresses, payment card numbers (Luhn-checked), US social
/// security numbers, phone numbers and IPv4 addresses. Card and SSN values
/// are returned with their middle digits masked.
pub struct PatternScanner {
    email: Regex,
    card: Regex,
    ssn: Regex,
    phone: Regex,
    ipv4: Regex,
}

impl PatternScanner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")?,
            // ASCII digits only: `\d` would also match other scripts' digits
            card: Regex::new(r"\b[0-9](?:[ -]?[0-9]){12,18}\b")?,
            ssn: Regex::new(r"\b[0-9]{3}-[0-9]{2}-[0-9]{4}\b")?,
            phone: Regex::new(
                r"(?:\+[0-9]{1,3}[ .-]?)?(?:\([0-9]{3}\)|\b[0-9]{3})[ .-]?[0-9]{3}[ .-][0-9]{4}\b",
            )?,
            ipv4: Regex::new(
                r"\b(?:(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\.){3}(?:25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])\b",
            )?,
        })
    }

    /// Synchronous scan; earlier detectors claim their spans first.
    pub fn find(&self, text: &str) -> Vec<PiiItem> {
        let mut claimed: Vec<Range<usize>> = Vec::new();
        let mut items = Vec::new();

        let mut collect = |re: &Regex, kind: &str, accept: &dyn Fn(&str) -> Option<String>| {
            for m in re.find_iter(text) {
                let span = m.range();
                if claimed.iter().any(|c| c.start < span.end && span.start < c.end) {
                    continue;
                }
                if let Some(value) = accept(m.as_str()) {
                    claimed.push(span);
                    items.push(PiiItem {
                        kind: kind.to_string(),
                        value,
                    });
                }
            }
        };

        collect(&self.email, "Email Address", &|s| Some(s.to_string()));
        collect(&self.card, "Credit Card", &|s| {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            luhn_valid(&digits).then(|| mask_middle(&digits, 4, 4))
        });
        collect(&self.ssn, "Social Security Number", &mask_ssn);
        collect(&self.phone, "Phone Number", &|s| Some(s.to_string()));
        collect(&self.ipv4, "IP Address", &|s| Some(s.to_string()));

        items
    }
}

#[async_trait]
impl TextScanner for PatternScanner {
    async fn scan(&self, text: &str) -> Result<Vec<PiiItem>, ScanError> {
        Ok(self.find(text))
    }
}

fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

/// `123-45-6789` → `123-**-6789`
fn mask_ssn(s: &str) -> Option<String> {
    let (area, rest) = s.split_once('-')?;
    let (_, serial) = rest.split_once('-')?;
    Some(format!("{area}-**-{serial}"))
}

fn mask_middle(s: &str, keep_start: usize, keep_end: usize) -> String {
    let len = s.chars().count();
    s.chars()
        .enumerate()
        .map(|(i, c)| {
            if i < keep_start || i >= len.saturating_sub(keep_end) {
                c
            } else {
                '*'
            }
        })
        .collect()
}
