//! Error types for attest-core.
//!
//! Two families of failure exist:
//! - call-level errors (`AttestError`): the whole invocation fails, nothing is returned
//! - item-level errors (`ItemError`): attached to one `ReconciledResult`, the batch continues
//!
//! Boundary collaborators report through `LedgerError` and `PlatformError`. Ledger errors
//! that abort a query are lifted into `AttestError`; platform errors are always item-level.

use thiserror::Error;

/// Result alias used across the core crate.
pub type AttestResult<T> = Result<T, AttestError>;

/// Call-level failure.
#[derive(Debug, Error)]
pub enum AttestError {
    /// Mutually exclusive parameters, empty fingerprint, bad configuration.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// A `start`/`end` value that is not `YYYY-MM-DD`.
    #[error("invalid date format {input:?}: expected YYYY-MM-DD")]
    InvalidDateFormat {
        input: String,
        #[source]
        source: time::error::Parse,
    },

    /// The ledger refused an unfiltered query because it would return too many items.
    #[error("too many notarizations are returned. Try to use --first or --last filter or datetime range filter")]
    ResourceExhausted(String),

    /// A single-key lookup found no entry.
    #[error("{0} was not notarized")]
    NotFound(String),

    /// The ledger failed its own integrity check for the requested entry.
    #[error("the ledger is compromised: {0}")]
    NotVerified(String),

    /// Transport failure reported by a boundary collaborator.
    #[error("transport error: {0}")]
    Transport(String),

    /// The invocation deadline elapsed before a complete result set was built.
    #[error("deadline exceeded after {0} ms")]
    DeadlineExceeded(u64),
}

impl AttestError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Failure reported by a `LedgerReader`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("key not found")]
    NotFound,

    #[error("ledger verification failed")]
    NotVerified,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Transport(String),
}

impl LedgerError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Lift into a call-level error. `subject` names the fingerprint being queried.
    pub fn into_attest(self, subject: &str, deadline_ms: u64) -> AttestError {
        match self {
            Self::ResourceExhausted(m) => AttestError::ResourceExhausted(m),
            Self::NotFound => AttestError::NotFound(subject.to_string()),
            Self::NotVerified => AttestError::NotVerified(subject.to_string()),
            Self::DeadlineExceeded => AttestError::DeadlineExceeded(deadline_ms),
            Self::Transport(m) => AttestError::Transport(m),
        }
    }
}

/// Failure reported by a `PlatformReader`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    #[error("artifact not found on platform")]
    NotFound,

    #[error("platform rejected credentials (status {0})")]
    Unauthorized(u16),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Transport(String),
}

impl PlatformError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// How much weight a consumer should give an item-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

/// Non-fatal failure attached to one reconciled result.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ItemError {
    #[error("malformed ledger item: {0}")]
    MalformedItem(String),

    #[error("platform metadata unavailable: {0}")]
    MetadataFetch(PlatformError),

    #[error("status not in sync (ledger: {ledger}, platform: {platform})")]
    StatusMismatch { ledger: String, platform: String },

    #[error("level not in sync (ledger: {ledger}, platform: {platform})")]
    LevelMismatch { ledger: i64, platform: i64 },

    #[error("the ledger is compromised: entry failed verification")]
    NotVerified,
}

impl ItemError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::StatusMismatch { .. } | Self::LevelMismatch { .. } | Self::MetadataFetch(_) => {
                Severity::Warning
            }
            Self::MalformedItem(_) => Severity::Error,
            Self::NotVerified => Severity::Critical,
        }
    }

    /// Stable machine-readable code, used by JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedItem(_) => "item.malformed",
            Self::MetadataFetch(_) => "platform.fetch",
            Self::StatusMismatch { .. } => "sync.status",
            Self::LevelMismatch { .. } => "sync.level",
            Self::NotVerified => "ledger.not_verified",
        }
    }

    pub fn is_sync_mismatch(&self) -> bool {
        matches!(self, Self::StatusMismatch { .. } | Self::LevelMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_verified_outranks_mismatch() {
        let nv = ItemError::NotVerified;
        let mm = ItemError::StatusMismatch {
            ledger: "TRUSTED".into(),
            platform: "UNTRUSTED".into(),
        };
        assert!(nv.severity() > mm.severity());
        assert!(mm.is_sync_mismatch());
        assert!(!nv.is_sync_mismatch());
    }

    #[test]
    fn mismatch_message_names_both_values() {
        let e = ItemError::StatusMismatch {
            ledger: "TRUSTED".into(),
            platform: "UNTRUSTED".into(),
        };
        let s = e.to_string();
        assert!(s.contains("ledger: TRUSTED"));
        assert!(s.contains("platform: UNTRUSTED"));
    }

    #[test]
    fn ledger_error_lifts_with_subject() {
        let e = LedgerError::NotFound.into_attest("abc123", 0);
        assert_eq!(e.to_string(), "abc123 was not notarized");

        let e = LedgerError::ResourceExhausted("max 1000".into()).into_attest("abc123", 0);
        assert!(e.to_string().contains("--first or --last"));
    }
}
