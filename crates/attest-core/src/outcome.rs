//! Single-artifact verification outcome and exit status.
//!
//! The outcome is a plain value returned up the call chain. The process exit code is
//! derived from it exactly once, at the outermost boundary.

use serde::Serialize;

use crate::aggregate::InspectReport;
use crate::errors::ItemError;
use crate::model::{ArtifactMetadata, Status, VerificationRecord};
use crate::reconcile::ReconciledResult;

/// How the ledger answered a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Notarized,
    NotNotarized,
    Compromised,
}

/// Result of verifying one artifact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub fingerprint: String,
    pub verdict: Verdict,
    /// Effective status after revocation and integrity adjustments.
    pub status: Status,
    #[serde(flatten)]
    pub result: ReconciledResult,
}

impl VerifyOutcome {
    pub fn not_notarized(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            verdict: Verdict::NotNotarized,
            status: Status::Unknown,
            result: ReconciledResult::default(),
        }
    }

    pub fn compromised(fingerprint: impl Into<String>) -> Self {
        let mut result = ReconciledResult::default();
        result.add_error(ItemError::NotVerified);
        Self {
            fingerprint: fingerprint.into(),
            verdict: Verdict::Compromised,
            status: Status::Unknown,
            result,
        }
    }

    /// Build from a reconciled lookup, applying revocation and integrity rules.
    pub fn from_lookup(fingerprint: impl Into<String>, verified: bool, mut result: ReconciledResult) -> Self {
        let mut status = result
            .record
            .as_ref()
            .map(|r| r.status)
            .unwrap_or(Status::Unknown);

        if result.metadata.as_ref().is_some_and(ArtifactMetadata::is_revoked) {
            status = Status::ApikeyRevoked;
        }

        let verdict = if verified {
            Verdict::Notarized
        } else {
            result.add_error(ItemError::NotVerified);
            status = Status::Unknown;
            Verdict::Compromised
        };

        Self {
            fingerprint: fingerprint.into(),
            verdict,
            status,
            result,
        }
    }

    pub fn record(&self) -> Option<&VerificationRecord> {
        self.result.record.as_ref()
    }

    /// Process exit code.
    ///
    /// Non-trusted statuses always win. A caller-supplied code replaces the success code
    /// only when the artifact is trusted.
    pub fn exit_code(&self, custom_success: Option<i32>) -> i32 {
        match self.status {
            Status::Trusted => custom_success.unwrap_or(0),
            other => other.code(),
        }
    }
}

impl InspectReport {
    /// Process exit code for an inspect run: unknown status if any entry failed the
    /// ledger's integrity check, success otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.has_critical() {
            Status::Unknown.code()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Fingerprint;
    use time::OffsetDateTime;

    fn record(status: Status) -> VerificationRecord {
        VerificationRecord {
            fingerprint: Fingerprint::new("abc123").unwrap(),
            meta_hash: "ff01".into(),
            status,
            level: 0,
            tx: 3,
            timestamp: OffsetDateTime::UNIX_EPOCH,
            signer: None,
            name: None,
            key: "abc123".into(),
        }
    }

    fn meta(revoked: bool) -> ArtifactMetadata {
        ArtifactMetadata {
            status: "TRUSTED".into(),
            level: 0,
            name: None,
            attachments: vec![],
            revoked: revoked.then_some(OffsetDateTime::UNIX_EPOCH),
        }
    }

    #[test]
    fn trusted_uses_custom_success_code() {
        let res = ReconciledResult::new(Some(record(Status::Trusted)), Some(meta(false)));
        let o = VerifyOutcome::from_lookup("abc123", true, res);
        assert_eq!(o.verdict, Verdict::Notarized);
        assert_eq!(o.exit_code(None), 0);
        assert_eq!(o.exit_code(Some(42)), 42);
    }

    #[test]
    fn revoked_overrides_status() {
        let res = ReconciledResult::new(Some(record(Status::Trusted)), Some(meta(true)));
        let o = VerifyOutcome::from_lookup("abc123", true, res);
        assert_eq!(o.status, Status::ApikeyRevoked);
        assert_eq!(o.exit_code(Some(42)), 4);
    }

    #[test]
    fn unverified_read_is_compromised() {
        let res = ReconciledResult::new(Some(record(Status::Trusted)), None);
        let o = VerifyOutcome::from_lookup("abc123", false, res);
        assert_eq!(o.verdict, Verdict::Compromised);
        assert_eq!(o.status, Status::Unknown);
        assert!(o.result.is_not_verified());
        assert_eq!(o.exit_code(Some(42)), 2);
    }

    #[test]
    fn not_notarized_is_unknown() {
        let o = VerifyOutcome::not_notarized("abc123");
        assert_eq!(o.exit_code(None), Status::Unknown.code());
        assert!(o.record().is_none());
    }

    #[test]
    fn untrusted_ignores_custom_code() {
        let res = ReconciledResult::new(Some(record(Status::Untrusted)), None);
        let o = VerifyOutcome::from_lookup("abc123", true, res);
        assert_eq!(o.exit_code(Some(42)), 1);
    }
}
