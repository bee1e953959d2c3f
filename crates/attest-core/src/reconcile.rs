//! Ledger/platform reconciliation.
//!
//! For every ledger record the platform's view of the same entry is fetched and compared.
//! Status and level are checked independently and both checks always run, so a single
//! pass reports every divergence. Nothing here returns an error: failures become
//! `ItemError`s on the result so that every attempted item yields a row.

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::errors::{ItemError, Severity};
use crate::mapper::map_item;
use crate::model::{ArtifactMetadata, RawItem, VerificationRecord};
use crate::ports::{CallContext, PlatformReader};

/// One reconciled row. Owned by whoever built it until handed to the aggregator.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledResult {
    pub record: Option<VerificationRecord>,
    pub metadata: Option<ArtifactMetadata>,
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<ItemError>,
}

impl ReconciledResult {
    pub fn new(record: Option<VerificationRecord>, metadata: Option<ArtifactMetadata>) -> Self {
        Self {
            record,
            metadata,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, e: ItemError) {
        self.errors.push(e);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Highest severity among attached errors.
    pub fn severity(&self) -> Option<Severity> {
        self.errors.iter().map(ItemError::severity).max()
    }

    pub fn is_not_verified(&self) -> bool {
        self.errors.iter().any(|e| matches!(e, ItemError::NotVerified))
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &ItemError> {
        self.errors.iter().filter(|e| e.is_sync_mismatch())
    }
}

fn serialize_errors<S: Serializer>(errors: &[ItemError], s: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Entry<'a> {
        code: &'a str,
        severity: Severity,
        message: String,
    }

    let mut seq = s.serialize_seq(Some(errors.len()))?;
    for e in errors {
        seq.serialize_element(&Entry {
            code: e.code(),
            severity: e.severity(),
            message: e.to_string(),
        })?;
    }
    seq.end()
}

/// Compare ledger and platform facts. Returns one error per divergent field.
pub fn compare(record: &VerificationRecord, metadata: &ArtifactMetadata) -> Vec<ItemError> {
    let mut out = Vec::new();

    if record.status.as_str() != metadata.status {
        out.push(ItemError::StatusMismatch {
            ledger: record.status.as_str().to_string(),
            platform: metadata.status.clone(),
        });
    }

    if record.level != metadata.level {
        out.push(ItemError::LevelMismatch {
            ledger: record.level,
            platform: metadata.level,
        });
    }

    out
}

/// Merge already-fetched facts into a result.
pub fn reconcile(
    record: Option<VerificationRecord>,
    metadata: Option<ArtifactMetadata>,
) -> ReconciledResult {
    let mut res = ReconciledResult::new(record, metadata);
    if let (Some(r), Some(m)) = (&res.record, &res.metadata) {
        let divergent = compare(r, m);
        if !divergent.is_empty() {
            debug!(fingerprint = %r.fingerprint, tx = r.tx, count = divergent.len(), "sync mismatch");
        }
        res.errors.extend(divergent);
    }
    res
}

/// Fetches platform metadata for ledger records and reconciles them.
pub struct Reconciler<'a> {
    platform: &'a dyn PlatformReader,
}

impl<'a> Reconciler<'a> {
    pub fn new(platform: &'a dyn PlatformReader) -> Self {
        Self { platform }
    }

    /// Map and reconcile one scanned ledger item. An entry whose integrity check failed
    /// keeps its row and carries `NotVerified` alongside any other finding.
    pub async fn reconcile_raw(&self, ctx: &CallContext, raw: &RawItem) -> ReconciledResult {
        let mut res = self.reconcile_item(ctx, map_item(raw)).await;
        if raw.verified == Some(false) {
            warn!(tx = raw.tx, key = %String::from_utf8_lossy(&raw.key), "ledger entry failed verification");
            res.add_error(ItemError::NotVerified);
        }
        res
    }

    /// Reconcile one mapped ledger item.
    ///
    /// A mapping failure yields a result carrying only that error; a metadata fetch failure
    /// keeps the ledger record and records the fetch error.
    pub async fn reconcile_item(
        &self,
        ctx: &CallContext,
        mapped: Result<VerificationRecord, ItemError>,
    ) -> ReconciledResult {
        let record = match mapped {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "ledger item degraded");
                let mut res = ReconciledResult::default();
                res.add_error(e);
                return res;
            }
        };

        match self
            .platform
            .fetch_metadata(ctx, &record.fingerprint, &record.meta_hash)
            .await
        {
            Ok(meta) => reconcile(Some(record), Some(meta)),
            Err(e) => {
                debug!(fingerprint = %record.fingerprint, error = %e, "platform metadata unavailable");
                let mut res = reconcile(Some(record), None);
                res.add_error(ItemError::MetadataFetch(e));
                res
            }
        }
    }
}
