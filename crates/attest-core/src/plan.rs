//! Query planning.
//!
//! Turns the caller's (signer?, first, last, start, end) into one of three query shapes:
//!
//! | start/end | signer | strategy                                       |
//! |-----------|--------|------------------------------------------------|
//! | no        | no     | `SignerScan` over the fingerprint set          |
//! | no        | yes    | `HistoryScan` of the signer-scoped key         |
//! | yes       | any    | `TimeRangeScan`, date-range partition if no signer |
//!
//! Reverse pagination (`last`) uses a seek sentinel: a run of `0xFF` bytes longer than any
//! key the scanned set can hold, so the first page starts past the greatest member.

use tracing::debug;

use crate::errors::{AttestError, AttestResult};
use crate::keys::{build_key, build_range_key, LedgerKey};
use crate::model::{Fingerprint, SignerId};
use crate::score::{parse_date, to_score};

/// Sentinel length for signer/unscoped set scans. Exceeds any signer-scoped key.
pub const SCAN_SEEK_SENTINEL_LEN: usize = 256;

/// Sentinel length for time-range scans. Accounts for the date-range prefix on top of
/// the longest scan key.
pub const RANGE_SEEK_SENTINEL_LEN: usize = 1024;

/// What the caller asked for.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub fingerprint: Fingerprint,
    pub signer: Option<SignerId>,
    /// Oldest-first page size; 0 means unset.
    pub first: u64,
    /// Newest-first page size; 0 means unset.
    pub last: u64,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl QueryParams {
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            signer: None,
            first: 0,
            last: 0,
            start: None,
            end: None,
        }
    }

    fn has_range(&self) -> bool {
        non_blank(&self.start).is_some() || non_blank(&self.end).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SignerScan,
    HistoryScan,
    TimeRangeScan,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignerScan => "signer-scan",
            Self::HistoryScan => "history-scan",
            Self::TimeRangeScan => "time-range-scan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn is_desc(&self) -> bool {
        matches!(self, Self::Descending)
    }
}

/// Inclusive score bounds for a time-range scan.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// The computed query. Transient: built once per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub strategy: Strategy,
    pub direction: Direction,
    /// 0 means unbounded; the ledger applies its own cap.
    pub limit: u64,
    pub seek_key: Option<Vec<u8>>,
    /// Set identifier for scans, key for history.
    pub key: LedgerKey,
    pub range: Option<ScoreRange>,
}

/// All-`0xFF` seek sentinel of the given length.
pub fn seek_sentinel(len: usize) -> Vec<u8> {
    vec![0xFF; len]
}

/// Select a strategy and pagination for the given parameters.
///
/// Fails before any I/O if both `first` and `last` are set, or if a date does not parse.
pub fn plan(params: &QueryParams) -> AttestResult<QueryPlan> {
    if params.first > 0 && params.last > 0 {
        return Err(AttestError::invalid_params(
            "first and last are mutually exclusive",
        ));
    }

    let signer = params.signer.as_ref();
    let key = build_key(&params.fingerprint, signer);

    let (strategy, key, range) = if params.has_range() {
        let range = score_range(params)?;
        (
            Strategy::TimeRangeScan,
            build_range_key(key, signer.is_some()),
            Some(range),
        )
    } else if signer.is_none() {
        (Strategy::SignerScan, key, None)
    } else {
        (Strategy::HistoryScan, key, None)
    };

    let (direction, limit, seek_key) = if params.last > 0 {
        let seek = match strategy {
            Strategy::SignerScan => Some(seek_sentinel(SCAN_SEEK_SENTINEL_LEN)),
            Strategy::TimeRangeScan => Some(seek_sentinel(RANGE_SEEK_SENTINEL_LEN)),
            // history reads walk a single key's versions, there is nothing to seek past
            Strategy::HistoryScan => None,
        };
        (Direction::Descending, params.last, seek)
    } else {
        (Direction::Ascending, params.first, None)
    };

    debug!(
        strategy = strategy.as_str(),
        desc = direction.is_desc(),
        limit,
        key = %key.display(),
        "query planned"
    );

    Ok(QueryPlan {
        strategy,
        direction,
        limit,
        seek_key,
        key,
        range,
    })
}

fn score_range(params: &QueryParams) -> AttestResult<ScoreRange> {
    let start = non_blank(&params.start).map(parse_date).transpose()?;
    let end = non_blank(&params.end).map(parse_date).transpose()?;

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(AttestError::invalid_params(format!(
                "start date {s} is after end date {e}"
            )));
        }
    }

    Ok(ScoreRange {
        min: start.map(to_score),
        max: end.map(to_score),
    })
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
