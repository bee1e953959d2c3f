//! In-memory ordered ledger.
//!
//! Mirrors the gateway's query semantics closely enough to exercise the engine end to end:
//! - every write is a transaction with a monotonically increasing id
//! - ordered sets hold (score, key, at_tx) members; scans order by that triple
//! - reverse scans start strictly below the seek position
//! - unbounded queries larger than the result cap fail with ResourceExhausted
//! - verified reads recheck a SHA-256 digest recorded at write time
//!
//! Used for development and tests; nothing is persisted.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::debug;

use attest_core::errors::LedgerError;
use attest_core::model::{RawItem, VerifiedItem};
use attest_core::ports::{CallContext, HistoryQuery, LedgerReader, ScoreScan, SetScan};

use crate::constants::{DEFAULT_MAX_RESULT_SIZE, MAX_KEY_LEN};
use crate::request::{HistoryRequest, ZScanRequest};

#[derive(Debug, Clone)]
struct TxEntry {
    key: Vec<u8>,
    value: Vec<u8>,
    digest: [u8; 32],
    timestamp: i64,
}

#[derive(Debug, Clone)]
struct Member {
    score: f64,
    key: Vec<u8>,
    at_tx: u64,
}

impl Member {
    fn position(&self, score: f64, key: &[u8], at_tx: u64) -> Ordering {
        self.score
            .total_cmp(&score)
            .then_with(|| self.key.as_slice().cmp(key))
            .then_with(|| self.at_tx.cmp(&at_tx))
    }
}

#[derive(Debug, Default)]
struct Inner {
    // index = tx - 1
    txs: Vec<TxEntry>,
    history: BTreeMap<Vec<u8>, Vec<u64>>,
    sets: BTreeMap<Vec<u8>, Vec<Member>>,
}

impl Inner {
    fn entry(&self, tx: u64) -> Option<&TxEntry> {
        self.txs.get(usize::try_from(tx).ok()?.checked_sub(1)?)
    }

    fn raw(&self, tx: u64, score: Option<f64>) -> Option<RawItem> {
        self.entry(tx).map(|e| RawItem {
            key: e.key.clone(),
            value: e.value.clone(),
            tx,
            score,
            timestamp: e.timestamp,
            verified: Some(digest(&e.key, &e.value) == e.digest),
        })
    }
}

/// In-memory ledger.
#[derive(Debug)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
    max_result_size: usize,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULT_SIZE)
    }
}

fn digest(key: &[u8], value: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update((key.len() as u64).to_be_bytes());
    h.update(key);
    h.update(value);
    h.finalize().into()
}

impl MemoryLedger {
    pub fn new(max_result_size: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_result_size,
        }
    }

    /// Write `value` under `key` with the current time. Returns the transaction id.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<u64, LedgerError> {
        self.set_at(key, value, time::OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Write `value` under `key` with an explicit commit time (seconds since epoch).
    pub fn set_at(&self, key: &[u8], value: &[u8], timestamp: i64) -> Result<u64, LedgerError> {
        check_key(key)?;
        let mut inner = self.inner.write();
        inner.txs.push(TxEntry {
            key: key.to_vec(),
            value: value.to_vec(),
            digest: digest(key, value),
            timestamp,
        });
        let tx = inner.txs.len() as u64;
        inner.history.entry(key.to_vec()).or_default().push(tx);
        Ok(tx)
    }

    /// Add `key` (at its latest transaction) to `set` with `score`.
    pub fn zadd(&self, set: &[u8], score: f64, key: &[u8]) -> Result<(), LedgerError> {
        check_key(set)?;
        let mut inner = self.inner.write();
        let at_tx = inner
            .history
            .get(key)
            .and_then(|v| v.last().copied())
            .ok_or(LedgerError::NotFound)?;
        let members = inner.sets.entry(set.to_vec()).or_default();
        let m = Member {
            score,
            key: key.to_vec(),
            at_tx,
        };
        let pos = members
            .binary_search_by(|x| x.position(m.score, &m.key, m.at_tx))
            .unwrap_or_else(|p| p);
        members.insert(pos, m);
        Ok(())
    }

    /// Overwrite the stored bytes of `tx` without updating its digest.
    pub fn tamper(&self, tx: u64, value: &[u8]) -> bool {
        let mut inner = self.inner.write();
        let Some(idx) = usize::try_from(tx).ok().and_then(|t| t.checked_sub(1)) else {
            return false;
        };
        match inner.txs.get_mut(idx) {
            Some(e) => {
                e.value = value.to_vec();
                true
            }
            None => false,
        }
    }

    /// Execute a set scan request.
    pub fn zscan(&self, req: &ZScanRequest) -> Result<Vec<RawItem>, LedgerError> {
        self.check_limit(req.limit)?;
        let inner = self.inner.read();
        let Some(members) = inner.sets.get(&req.set) else {
            return Ok(Vec::new());
        };

        let min = req.min_score.map(|s| s.score);
        let max = req.max_score.map(|s| s.score);
        let seek = req.seek_key.as_deref().filter(|k| !k.is_empty());

        let in_range = |m: &&Member| {
            min.map_or(true, |v| m.score >= v) && max.map_or(true, |v| m.score <= v)
        };
        let past_seek = |m: &&Member| match seek {
            None => true,
            Some(k) => {
                let ord = m.position(req.seek_score, k, req.seek_at_tx);
                if req.desc {
                    ord == Ordering::Less
                } else {
                    ord == Ordering::Greater
                }
            }
        };

        let selected: Vec<&Member> = if req.desc {
            members.iter().rev().filter(in_range).filter(past_seek).collect()
        } else {
            members.iter().filter(in_range).filter(past_seek).collect()
        };

        let selected = self.cap(selected, req.limit)?;
        debug!(set = %String::from_utf8_lossy(&req.set), count = selected.len(), "memory zscan");

        Ok(selected
            .into_iter()
            .filter_map(|m| inner.raw(m.at_tx, Some(m.score)))
            .collect())
    }

    /// Execute a history request.
    pub fn history(&self, req: &HistoryRequest) -> Result<Vec<RawItem>, LedgerError> {
        let limit = u64::try_from(req.limit).unwrap_or(0);
        self.check_limit(limit)?;
        let inner = self.inner.read();
        let Some(txs) = inner.history.get(&req.key) else {
            return Ok(Vec::new());
        };

        let ordered: Vec<u64> = if req.desc {
            txs.iter().rev().copied().collect()
        } else {
            txs.clone()
        };
        let ordered = self.cap(ordered, limit)?;

        Ok(ordered
            .into_iter()
            .filter_map(|tx| inner.raw(tx, None))
            .collect())
    }

    /// Latest value of `key` with its integrity check outcome.
    pub fn verified_read(&self, key: &[u8]) -> Result<VerifiedItem, LedgerError> {
        let inner = self.inner.read();
        let tx = inner
            .history
            .get(key)
            .and_then(|v| v.last().copied())
            .ok_or(LedgerError::NotFound)?;
        let entry = inner.entry(tx).ok_or(LedgerError::NotFound)?;
        let verified = digest(&entry.key, &entry.value) == entry.digest;
        let item = inner.raw(tx, None).ok_or(LedgerError::NotFound)?;
        Ok(VerifiedItem { item, verified })
    }

    fn check_limit(&self, limit: u64) -> Result<(), LedgerError> {
        if limit > self.max_result_size as u64 {
            return Err(LedgerError::ResourceExhausted(format!(
                "limit {limit} exceeds maximum result size {}",
                self.max_result_size
            )));
        }
        Ok(())
    }

    fn cap<T>(&self, mut items: Vec<T>, limit: u64) -> Result<Vec<T>, LedgerError> {
        if limit == 0 {
            if items.len() > self.max_result_size {
                return Err(LedgerError::ResourceExhausted(format!(
                    "{} items exceed maximum result size {}",
                    items.len(),
                    self.max_result_size
                )));
            }
        } else {
            items.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(items)
    }
}

fn check_key(key: &[u8]) -> Result<(), LedgerError> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(LedgerError::transport(format!(
            "invalid key length {}",
            key.len()
        )));
    }
    Ok(())
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn scan_by_set(&self, ctx: &CallContext, scan: &SetScan) -> Result<Vec<RawItem>, LedgerError> {
        expired(ctx)?;
        self.zscan(&ZScanRequest::from_set_scan(scan))
    }

    async fn scan_by_score(&self, ctx: &CallContext, scan: &ScoreScan) -> Result<Vec<RawItem>, LedgerError> {
        expired(ctx)?;
        self.zscan(&ZScanRequest::from_score_scan(scan))
    }

    async fn history_of(&self, ctx: &CallContext, query: &HistoryQuery) -> Result<Vec<RawItem>, LedgerError> {
        expired(ctx)?;
        self.history(&HistoryRequest::from_query(query))
    }

    async fn verified_get(&self, ctx: &CallContext, key: &[u8]) -> Result<VerifiedItem, LedgerError> {
        expired(ctx)?;
        self.verified_read(key)
    }
}

fn expired(ctx: &CallContext) -> Result<(), LedgerError> {
    if ctx.is_expired() {
        Err(LedgerError::DeadlineExceeded)
    } else {
        Ok(())
    }
}
