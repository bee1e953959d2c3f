//! Raw ledger item -> `VerificationRecord`.
//!
//! Ledger values are JSON notarization payloads. Status may be stored either as its numeric
//! code or as its name depending on the writer's version; both are accepted.
//!
//! A mapping failure is an `ItemError::MalformedItem` for that item only. Callers attach it
//! to the item's result and keep going.

use serde::Deserialize;
use time::OffsetDateTime;

use crate::errors::ItemError;
use crate::model::{Fingerprint, RawItem, Status, VerificationRecord};
use crate::score::from_score;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerPayload {
    hash: String,
    meta_hash: String,
    status: StatusField,
    #[serde(default)]
    level: i64,
    #[serde(default)]
    signer: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusField {
    Code(i64),
    Name(String),
}

impl StatusField {
    fn resolve(&self) -> Option<Status> {
        match self {
            Self::Code(c) => Status::from_code(*c),
            Self::Name(n) => Status::parse(n),
        }
    }
}

/// Map one raw ledger item.
pub fn map_item(item: &RawItem) -> Result<VerificationRecord, ItemError> {
    let payload: LedgerPayload = serde_json::from_slice(&item.value)
        .map_err(|e| malformed(item, format!("invalid payload: {e}")))?;

    let fingerprint =
        Fingerprint::new(&payload.hash).map_err(|e| malformed(item, e.to_string()))?;

    if payload.meta_hash.trim().is_empty() {
        return Err(malformed(item, "empty metaHash".to_string()));
    }

    let status = payload
        .status
        .resolve()
        .ok_or_else(|| malformed(item, format!("unknown status {:?}", payload.status)))?;

    let timestamp = item_timestamp(item)
        .ok_or_else(|| malformed(item, format!("timestamp out of range: {}", item.timestamp)))?;

    Ok(VerificationRecord {
        fingerprint,
        meta_hash: payload.meta_hash.trim().to_ascii_lowercase(),
        status,
        level: payload.level,
        tx: item.tx,
        timestamp,
        signer: payload.signer.filter(|s| !s.is_empty()),
        name: payload.name.filter(|s| !s.is_empty()),
        key: String::from_utf8_lossy(&item.key).into_owned(),
    })
}

// Older entries carry no commit time; fall back to the index score.
fn item_timestamp(item: &RawItem) -> Option<OffsetDateTime> {
    if item.timestamp == 0 {
        if let Some(score) = item.score {
            return from_score(score);
        }
    }
    OffsetDateTime::from_unix_timestamp(item.timestamp).ok()
}

fn malformed(item: &RawItem, reason: String) -> ItemError {
    ItemError::MalformedItem(format!(
        "tx {} key {}: {reason}",
        item.tx,
        String::from_utf8_lossy(&item.key)
    ))
}
