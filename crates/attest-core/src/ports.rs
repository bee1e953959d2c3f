//! Boundary contracts consumed by the engine.
//!
//! The engine never talks to the network itself. It drives two collaborators:
//! - `LedgerReader`: read-only queries against the ordered ledger store
//! - `PlatformReader`: metadata lookups against the mutable platform
//!
//! Every call receives a `CallContext` carrying the invocation deadline so that
//! implementations can bound their own transport timeouts. Calls are idempotent and must
//! not retry internally.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::errors::{LedgerError, PlatformError};
use crate::model::{ArtifactMetadata, Fingerprint, RawItem, VerifiedItem};

/// Per-invocation call context.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext {
    pub deadline: Option<Instant>,
}

impl CallContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(d) if d.is_zero())
    }
}

/// Scan over a named ordered set.
#[derive(Debug, Clone, PartialEq)]
pub struct SetScan {
    pub set: Vec<u8>,
    pub limit: u64,
    pub desc: bool,
    pub seek_key: Option<Vec<u8>>,
}

/// Set scan additionally bounded by score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreScan {
    pub scan: SetScan,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

/// Every historical version of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub key: Vec<u8>,
    pub limit: u64,
    pub desc: bool,
}

/// Read access to the ledger.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn scan_by_set(&self, ctx: &CallContext, scan: &SetScan)
        -> Result<Vec<RawItem>, LedgerError>;

    async fn scan_by_score(
        &self,
        ctx: &CallContext,
        scan: &ScoreScan,
    ) -> Result<Vec<RawItem>, LedgerError>;

    async fn history_of(
        &self,
        ctx: &CallContext,
        query: &HistoryQuery,
    ) -> Result<Vec<RawItem>, LedgerError>;

    /// Latest value of `key`, read through the ledger's integrity-checked path.
    ///
    /// Returns `LedgerError::NotFound` when the key has never been written.
    async fn verified_get(&self, ctx: &CallContext, key: &[u8])
        -> Result<VerifiedItem, LedgerError>;
}

/// Read access to platform metadata.
#[async_trait]
pub trait PlatformReader: Send + Sync {
    async fn fetch_metadata(
        &self,
        ctx: &CallContext,
        fingerprint: &Fingerprint,
        meta_hash: &str,
    ) -> Result<ArtifactMetadata, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_unbounded() {
        let ctx = CallContext::default();
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_expired());
    }

    #[tokio::test]
    async fn zero_timeout_is_expired() {
        let ctx = CallContext::with_timeout(Duration::ZERO);
        assert!(ctx.is_expired());
    }
}
