//! Wire encoding of ledger requests and responses.
//!
//! Byte fields (keys, values, seek keys) travel as lowercase hex. Scans always pin the
//! seek score and transaction to their maxima and ask the server not to wait for
//! indexing, so a query sees whatever the index holds at call time.

use serde::{Deserialize, Serialize};

use attest_core::model::RawItem;
use attest_core::ports::{HistoryQuery, ScoreScan, SetScan};

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(b: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(b))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

mod hex_bytes_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(b: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match b {
            Some(b) => s.serialize_some(&hex::encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let s = Option::<String>::deserialize(d)?;
        s.map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Score bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub score: f64,
}

/// Ordered-set scan request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZScanRequest {
    #[serde(with = "hex_bytes")]
    pub set: Vec<u8>,
    #[serde(with = "hex_bytes_opt", default, skip_serializing_if = "Option::is_none")]
    pub seek_key: Option<Vec<u8>>,
    pub seek_score: f64,
    pub seek_at_tx: u64,
    pub limit: u64,
    pub desc: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<Score>,
    pub since_tx: u64,
    pub no_wait: bool,
}

impl ZScanRequest {
    pub fn from_set_scan(scan: &SetScan) -> Self {
        Self {
            set: scan.set.clone(),
            seek_key: scan.seek_key.clone(),
            seek_score: f64::MAX,
            seek_at_tx: u64::MAX,
            limit: scan.limit,
            desc: scan.desc,
            min_score: None,
            max_score: None,
            since_tx: u64::MAX,
            no_wait: true,
        }
    }

    pub fn from_score_scan(scan: &ScoreScan) -> Self {
        Self {
            min_score: scan.min_score.map(|score| Score { score }),
            max_score: scan.max_score.map(|score| Score { score }),
            ..Self::from_set_scan(&scan.scan)
        }
    }
}

/// Key history request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
    pub limit: i32,
    pub desc: bool,
    pub since_tx: u64,
}

impl HistoryRequest {
    pub fn from_query(q: &HistoryQuery) -> Self {
        Self {
            key: q.key.clone(),
            // the gateway takes a signed 32-bit limit; anything larger means "no limit"
            limit: i32::try_from(q.limit).unwrap_or(0),
            desc: q.desc,
            since_tx: u64::MAX,
        }
    }
}

/// Integrity-checked single-key read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedGetRequest {
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
}

/// One item on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem {
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
    pub tx: u64,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl From<WireItem> for RawItem {
    fn from(w: WireItem) -> Self {
        RawItem {
            key: w.key,
            value: w.value,
            tx: w.tx,
            score: w.score,
            timestamp: w.timestamp,
            verified: w.verified,
        }
    }
}

impl From<&RawItem> for WireItem {
    fn from(r: &RawItem) -> Self {
        WireItem {
            key: r.key.clone(),
            value: r.value.clone(),
            tx: r.tx,
            score: r.score,
            timestamp: r.timestamp,
            verified: r.verified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemList {
    #[serde(default)]
    pub items: Vec<WireItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedEntry {
    pub item: WireItem,
    pub verified: bool,
}

/// Error body returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayError {
    /// gRPC-style status name, e.g. `ResourceExhausted`.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
