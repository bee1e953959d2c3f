//! Timestamp <-> score encoding.
//!
//! Ledger sets are ordered by an `f64` score; notarizations are indexed with their
//! nanosecond epoch timestamp as the score.
//!
//! Precision: an `f64` carries a 53-bit mantissa, so integers are exact only up to 2^53
//! (~9.0e15). Nanosecond timestamps for present-day dates are ~1.7e18, where adjacent
//! representable values are 256 ns apart. Second-granularity ordering is therefore
//! preserved exactly, nanosecond ordering is not. Records that share a second are ordered
//! by the ledger's own tie-break (transaction sequence), never by the score.

use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::errors::{AttestError, AttestResult};

/// Largest integer an `f64` score represents without loss.
pub const MAX_EXACT_SCORE: f64 = 9_007_199_254_740_992.0;

/// Spacing between adjacent scores at `nanos`, i.e. the encoding's resolution there.
pub fn resolution_at(nanos: f64) -> f64 {
    if nanos.abs() < MAX_EXACT_SCORE {
        return 1.0;
    }
    let exp = nanos.abs().log2().floor() as i32;
    2f64.powi(exp - 52)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> AttestResult<Date> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(input.trim(), fmt).map_err(|source| AttestError::InvalidDateFormat {
        input: input.to_string(),
        source,
    })
}

/// Score of a date: midnight UTC, nanoseconds since epoch.
pub fn to_score(date: Date) -> f64 {
    datetime_to_score(date.midnight().assume_utc())
}

/// Score of an arbitrary instant.
pub fn datetime_to_score(at: OffsetDateTime) -> f64 {
    at.unix_timestamp_nanos() as f64
}

/// Recover an instant from a score, rounded to the second.
pub fn from_score(score: f64) -> Option<OffsetDateTime> {
    if !score.is_finite() {
        return None;
    }
    let secs = (score / 1_000_000_000.0).round() as i64;
    OffsetDateTime::from_unix_timestamp(secs).ok()
}
