//! Inspect and verify orchestration.
//!
//! One invocation runs: plan -> one ledger call -> map each item -> reconcile each item
//! against the platform -> aggregate. Planning errors fail before any I/O. Metadata fetches
//! run with bounded concurrency but results keep the ledger's order.
//!
//! The whole invocation is bounded by one deadline. If it elapses, everything reconciled so
//! far is dropped and `DeadlineExceeded` is returned; a truncated list is never returned.
//! Dropping the returned future cancels the ledger call and in-flight fetches.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::aggregate::{InspectReport, ResultAggregator};
use crate::config::LimitsConfig;
use crate::errors::{AttestError, AttestResult, LedgerError};
use crate::keys::build_key;
use crate::mapper::map_item;
use crate::model::{Fingerprint, RawItem, SignerId};
use crate::outcome::VerifyOutcome;
use crate::plan::{plan, QueryParams, QueryPlan, Strategy};
use crate::ports::{CallContext, HistoryQuery, LedgerReader, PlatformReader, ScoreScan, SetScan};
use crate::reconcile::Reconciler;

/// Drives the reconciliation pipeline over a ledger and a platform.
pub struct Engine<'a> {
    ledger: &'a dyn LedgerReader,
    platform: &'a dyn PlatformReader,
    limits: LimitsConfig,
}

impl<'a> Engine<'a> {
    pub fn new(
        ledger: &'a dyn LedgerReader,
        platform: &'a dyn PlatformReader,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            ledger,
            platform,
            limits,
        }
    }

    /// Historical query over the ledger, reconciled row by row.
    pub async fn inspect(&self, params: &QueryParams) -> AttestResult<InspectReport> {
        let plan = plan(params)?;
        let ctx = self.call_context();
        self.with_deadline(self.run_inspect(&ctx, params, &plan)).await
    }

    /// Single-key verified lookup for the latest notarization of an artifact.
    pub async fn verify(
        &self,
        fingerprint: &Fingerprint,
        signer: Option<&SignerId>,
    ) -> AttestResult<VerifyOutcome> {
        let ctx = self.call_context();
        self.with_deadline(self.run_verify(&ctx, fingerprint, signer))
            .await
    }

    async fn run_inspect(
        &self,
        ctx: &CallContext,
        params: &QueryParams,
        plan: &QueryPlan,
    ) -> AttestResult<InspectReport> {
        let items = self
            .fetch(ctx, plan)
            .await
            .map_err(|e| self.lift(e, &params.fingerprint))?;

        info!(
            fingerprint = %params.fingerprint,
            strategy = plan.strategy.as_str(),
            count = items.len(),
            "ledger returned items"
        );

        let reconciler = Reconciler::new(self.platform);
        let rows = stream::iter(items.iter())
            .map(|raw| reconciler.reconcile_raw(ctx, raw))
            .buffered(self.limits.max_concurrent_fetches.max(1))
            .collect::<Vec<_>>()
            .await;

        let aggregator = ResultAggregator::new(
            params.fingerprint.as_str(),
            params.signer.as_ref().map(|s| s.to_string()),
            plan.strategy,
            plan.direction,
        );
        Ok(aggregator.aggregate(rows))
    }

    async fn run_verify(
        &self,
        ctx: &CallContext,
        fingerprint: &Fingerprint,
        signer: Option<&SignerId>,
    ) -> AttestResult<VerifyOutcome> {
        let key = build_key(fingerprint, signer);
        debug!(key = %key.display(), "verified lookup");

        let found = match self.ledger.verified_get(ctx, key.as_bytes()).await {
            Ok(v) => v,
            Err(LedgerError::NotFound) => {
                return Ok(VerifyOutcome::not_notarized(fingerprint.as_str()));
            }
            Err(LedgerError::NotVerified) => {
                return Ok(VerifyOutcome::compromised(fingerprint.as_str()));
            }
            Err(e) => return Err(self.lift(e, fingerprint)),
        };

        let reconciler = Reconciler::new(self.platform);
        let result = reconciler.reconcile_item(ctx, map_item(&found.item)).await;
        Ok(VerifyOutcome::from_lookup(
            fingerprint.as_str(),
            found.verified,
            result,
        ))
    }

    async fn fetch(&self, ctx: &CallContext, plan: &QueryPlan) -> Result<Vec<RawItem>, LedgerError> {
        let desc = plan.direction.is_desc();
        match plan.strategy {
            Strategy::SignerScan => {
                let scan = SetScan {
                    set: plan.key.as_bytes().to_vec(),
                    limit: plan.limit,
                    desc,
                    seek_key: plan.seek_key.clone(),
                };
                self.ledger.scan_by_set(ctx, &scan).await
            }
            Strategy::HistoryScan => {
                let query = HistoryQuery {
                    key: plan.key.as_bytes().to_vec(),
                    limit: plan.limit,
                    desc,
                };
                // a key that was never written has an empty history
                match self.ledger.history_of(ctx, &query).await {
                    Err(LedgerError::NotFound) => Ok(Vec::new()),
                    other => other,
                }
            }
            Strategy::TimeRangeScan => {
                let range = plan.range.unwrap_or_default();
                let scan = ScoreScan {
                    scan: SetScan {
                        set: plan.key.as_bytes().to_vec(),
                        limit: plan.limit,
                        desc,
                        seek_key: plan.seek_key.clone(),
                    },
                    min_score: range.min,
                    max_score: range.max,
                };
                self.ledger.scan_by_score(ctx, &scan).await
            }
        }
    }

    fn call_context(&self) -> CallContext {
        match self.deadline() {
            Some(d) => CallContext::with_timeout(d),
            None => CallContext::default(),
        }
    }

    fn deadline(&self) -> Option<Duration> {
        (self.limits.deadline_ms > 0).then(|| Duration::from_millis(self.limits.deadline_ms))
    }

    async fn with_deadline<T>(&self, fut: impl Future<Output = AttestResult<T>>) -> AttestResult<T> {
        match self.deadline() {
            None => fut.await,
            Some(d) => match tokio::time::timeout(d, fut).await {
                Ok(r) => r,
                Err(_) => Err(AttestError::DeadlineExceeded(self.limits.deadline_ms)),
            },
        }
    }

    fn lift(&self, e: LedgerError, fingerprint: &Fingerprint) -> AttestError {
        e.into_attest(fingerprint.as_str(), self.limits.deadline_ms)
    }
}
