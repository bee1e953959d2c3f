//! attest data models.
//!
//! Two sources of truth are modelled side by side:
//! - **ledger facts** (`RawItem`, `VerificationRecord`): read from the append-only ledger,
//!   immutable once read
//! - **platform facts** (`ArtifactMetadata`): owned and mutated by the platform, read-only here
//!
//! The identifiers (`Fingerprint`, `SignerId`) are normalised at construction so that every
//! downstream key derivation sees the same bytes.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::{AttestError, AttestResult};

/// Content-derived artifact identifier, always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Normalise and validate a fingerprint.
    ///
    /// Empty or whitespace-containing values are rejected here so that the key codec never
    /// sees them.
    pub fn new(raw: &str) -> AttestResult<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(AttestError::invalid_params("fingerprint must not be empty"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(AttestError::invalid_params(format!(
                "fingerprint must not contain whitespace: {raw:?}"
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque signer identity. Scopes queries to a signer-prefixed key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SignerId(String);

impl SignerId {
    /// An empty or blank identity means "no signer".
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            None
        } else {
            Some(Self(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for SignerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notarization status. Discriminants double as process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Trusted = 0,
    Untrusted = 1,
    Unknown = 2,
    Unsupported = 3,
    ApikeyRevoked = 4,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trusted => "TRUSTED",
            Self::Untrusted => "UNTRUSTED",
            Self::Unknown => "UNKNOWN",
            Self::Unsupported => "UNSUPPORTED",
            Self::ApikeyRevoked => "APIKEY_REVOKED",
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Trusted),
            1 => Some(Self::Untrusted),
            2 => Some(Self::Unknown),
            3 => Some(Self::Unsupported),
            4 => Some(Self::ApikeyRevoked),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRUSTED" => Some(Self::Trusted),
            "UNTRUSTED" => Some(Self::Untrusted),
            "UNKNOWN" => Some(Self::Unknown),
            "UNSUPPORTED" => Some(Self::Unsupported),
            "APIKEY_REVOKED" => Some(Self::ApikeyRevoked),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry as returned by the ledger, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    /// Ledger key of the entry (for set scans: the member key).
    pub key: Vec<u8>,
    /// Stored payload.
    pub value: Vec<u8>,
    /// Transaction sequence number that wrote the payload.
    pub tx: u64,
    /// Score within the scanned set, if the item came from a set scan.
    pub score: Option<f64>,
    /// Ledger commit time, seconds since epoch.
    pub timestamp: i64,
    /// Per-entry integrity check, when the ledger reported one.
    pub verified: Option<bool>,
}

/// A ledger entry read through the verified path.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedItem {
    pub item: RawItem,
    /// Outcome of the ledger client's own integrity check.
    pub verified: bool,
}

/// Ledger-sourced verification fact. Created by the record mapper, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub fingerprint: Fingerprint,
    pub meta_hash: String,
    pub status: Status,
    pub level: i64,
    pub tx: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ledger key, lossily rendered for display.
    pub key: String,
}

/// File attached to an artifact on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub hash: String,
    #[serde(default)]
    pub mime: Option<String>,
}

/// Platform-sourced metadata for an artifact entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    pub status: String,
    pub level: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub revoked: Option<OffsetDateTime>,
}

impl ArtifactMetadata {
    pub fn is_revoked(&self) -> bool {
        self.revoked.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_lowercased() {
        let f = Fingerprint::new("  ABC123 ").unwrap();
        assert_eq!(f.as_str(), "abc123");
    }

    #[test]
    fn fingerprint_rejects_empty() {
        assert!(Fingerprint::new("").is_err());
        assert!(Fingerprint::new("   ").is_err());
        assert!(Fingerprint::new("ab cd").is_err());
    }

    #[test]
    fn blank_signer_is_none() {
        assert!(SignerId::parse("").is_none());
        assert!(SignerId::parse("  ").is_none());
        assert_eq!(SignerId::parse("sig1").unwrap().as_str(), "sig1");
    }

    #[test]
    fn status_codes_round_trip() {
        for s in [
            Status::Trusted,
            Status::Untrusted,
            Status::Unknown,
            Status::Unsupported,
            Status::ApikeyRevoked,
        ] {
            assert_eq!(Status::from_code(s.code() as i64), Some(s));
            assert_eq!(Status::parse(s.as_str()), Some(s));
        }
        assert_eq!(Status::from_code(9), None);
    }

    #[test]
    fn metadata_deserializes_platform_payload() {
        let raw = serde_json::json!({
            "status": "TRUSTED",
            "level": 2,
            "attachments": [{"filename": "notes.txt", "hash": "ff00"}],
            "revoked": "2024-03-01T10:00:00Z"
        });
        let m: ArtifactMetadata = serde_json::from_value(raw).unwrap();
        assert_eq!(m.level, 2);
        assert_eq!(m.attachments.len(), 1);
        assert!(m.is_revoked());
    }

    #[test]
    fn metadata_revoked_defaults_to_none() {
        let raw = serde_json::json!({"status": "UNTRUSTED", "level": 0});
        let m: ArtifactMetadata = serde_json::from_value(raw).unwrap();
        assert!(!m.is_revoked());
        assert!(m.attachments.is_empty());
    }
}
