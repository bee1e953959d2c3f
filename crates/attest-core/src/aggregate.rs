//! Result packaging.
//!
//! The aggregator keeps the ledger's order (ascending or descending per the plan) and
//! never filters. Summary counts are derived from the rows, so a count is produced even
//! when every row carries an error.

use serde::Serialize;

use crate::errors::Severity;
use crate::plan::{Direction, Strategy};
use crate::reconcile::ReconciledResult;

/// Counters for summary reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub with_errors: usize,
    pub mismatched: usize,
    pub malformed: usize,
    pub not_verified: usize,
}

/// Ordered outcome of one inspect invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    pub strategy: &'static str,
    pub descending: bool,
    pub summary: Summary,
    pub results: Vec<ReconciledResult>,
}

impl InspectReport {
    pub fn total(&self) -> usize {
        self.summary.total
    }

    /// True if any row carries a critical (ledger integrity) error.
    pub fn has_critical(&self) -> bool {
        self.summary.not_verified > 0
    }
}

/// Builds an `InspectReport` from rows in ledger order.
#[derive(Debug)]
pub struct ResultAggregator {
    fingerprint: String,
    signer: Option<String>,
    strategy: Strategy,
    direction: Direction,
}

impl ResultAggregator {
    pub fn new(
        fingerprint: impl Into<String>,
        signer: Option<String>,
        strategy: Strategy,
        direction: Direction,
    ) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            signer,
            strategy,
            direction,
        }
    }

    pub fn aggregate(self, items: Vec<ReconciledResult>) -> InspectReport {
        let summary = summarize(&items);
        InspectReport {
            fingerprint: self.fingerprint,
            signer: self.signer,
            strategy: self.strategy.as_str(),
            descending: self.direction.is_desc(),
            summary,
            results: items,
        }
    }
}

pub fn summarize(items: &[ReconciledResult]) -> Summary {
    let mut s = Summary {
        total: items.len(),
        ..Summary::default()
    };
    for it in items {
        if it.has_errors() {
            s.with_errors += 1;
        }
        if it.mismatches().next().is_some() {
            s.mismatched += 1;
        }
        if it.is_not_verified() {
            s.not_verified += 1;
        }
        if it.errors.iter().any(|e| e.severity() == Severity::Error) {
            s.malformed += 1;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ItemError;

    fn row(errors: Vec<ItemError>) -> ReconciledResult {
        ReconciledResult {
            errors,
            ..ReconciledResult::default()
        }
    }

    #[test]
    fn order_is_preserved_and_counted() {
        let items = vec![
            row(vec![]),
            row(vec![ItemError::MalformedItem("x".into())]),
            row(vec![ItemError::NotVerified]),
            row(vec![ItemError::StatusMismatch {
                ledger: "TRUSTED".into(),
                platform: "UNKNOWN".into(),
            }]),
        ];
        let report = ResultAggregator::new("abc123", None, Strategy::SignerScan, Direction::Descending)
            .aggregate(items);

        assert_eq!(report.total(), 4);
        assert_eq!(report.summary.with_errors, 3);
        assert_eq!(report.summary.malformed, 1);
        assert_eq!(report.summary.mismatched, 1);
        assert!(report.has_critical());
        assert!(report.descending);
        assert!(report.results[0].errors.is_empty());
        assert!(report.results[2].is_not_verified());
    }

    #[test]
    fn empty_batch_still_has_summary() {
        let report = ResultAggregator::new("abc123", None, Strategy::HistoryScan, Direction::Ascending)
            .aggregate(vec![]);
        assert_eq!(report.summary, Summary::default());
        assert_eq!(report.strategy, "history-scan");
    }
}
