//! In-memory platform metadata.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use attest_core::errors::PlatformError;
use attest_core::model::{ArtifactMetadata, Fingerprint};
use attest_core::ports::{CallContext, PlatformReader};

/// Metadata addressed by `(fingerprint, meta_hash)`.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    entries: RwLock<HashMap<(String, String), ArtifactMetadata>>,
    failing: RwLock<Option<PlatformError>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, fingerprint: &Fingerprint, meta_hash: &str, metadata: ArtifactMetadata) {
        self.entries
            .write()
            .insert((fingerprint.as_str().to_string(), meta_hash.to_string()), metadata);
    }

    /// Make every subsequent fetch fail with `err`; `None` restores normal lookups.
    pub fn fail_with(&self, err: Option<PlatformError>) {
        *self.failing.write() = err;
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl PlatformReader for MemoryPlatform {
    async fn fetch_metadata(
        &self,
        ctx: &CallContext,
        fingerprint: &Fingerprint,
        meta_hash: &str,
    ) -> Result<ArtifactMetadata, PlatformError> {
        if ctx.is_expired() {
            return Err(PlatformError::DeadlineExceeded);
        }
        if let Some(e) = self.failing.read().clone() {
            return Err(e);
        }
        self.entries
            .read()
            .get(&(fingerprint.as_str().to_string(), meta_hash.to_string()))
            .cloned()
            .ok_or(PlatformError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn meta(status: &str) -> ArtifactMetadata {
        ArtifactMetadata {
            status: status.to_string(),
            level: 0,
            name: None,
            attachments: Vec::new(),
            revoked: None,
        }
    }

    #[tokio::test]
    async fn lookup_is_keyed_by_meta_hash() {
        let p = MemoryPlatform::new();
        let fp = Fingerprint::new("abc").unwrap();
        p.insert(&fp, "m1", meta("TRUSTED"));
        p.insert(&fp, "m2", meta("UNTRUSTED"));
        assert_eq!(p.len(), 2);

        let ctx = CallContext::default();
        assert_eq!(p.fetch_metadata(&ctx, &fp, "m2").await.unwrap().status, "UNTRUSTED");
        assert_matches!(p.fetch_metadata(&ctx, &fp, "m3").await, Err(PlatformError::NotFound));
    }

    #[tokio::test]
    async fn injected_failure() {
        let p = MemoryPlatform::new();
        let fp = Fingerprint::new("abc").unwrap();
        p.insert(&fp, "m1", meta("TRUSTED"));
        p.fail_with(Some(PlatformError::Unauthorized(401)));
        let ctx = CallContext::default();
        assert_matches!(p.fetch_metadata(&ctx, &fp, "m1").await, Err(PlatformError::Unauthorized(401)));
        p.fail_with(None);
        assert!(p.fetch_metadata(&ctx, &fp, "m1").await.is_ok());
    }
}
