//! Ledger key derivation.
//!
//! Keys are plain byte strings compared lexicographically by the ledger, so the layout
//! must be deterministic and order-preserving:
//! - unscoped: `fingerprint`
//! - signer-scoped: `vcn.` ++ signer ++ `.` ++ fingerprint
//! - date-range index (unscoped only): `_INDEX.DATERANGE.` ++ key
//!
//! Keys are never parsed back by this crate. The fingerprint is lowercase and contains no
//! `.`, so the last separator still splits a signer-scoped key unambiguously.

use crate::model::{Fingerprint, SignerId};

/// Prefix of the signer-scoped key space.
pub const SIGNER_PREFIX: &[u8] = b"vcn.";

/// Separator between the signer identity and the fingerprint.
pub const SIGNER_SEPARATOR: u8 = b'.';

/// Partition marker for date-range index sets.
pub const DATE_RANGE_PREFIX: &[u8] = b"_INDEX.DATERANGE.";

/// A ledger key or set identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedgerKey(Vec<u8>);

impl LedgerKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lossy UTF-8 rendering for logs and output.
    pub fn display(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl From<Vec<u8>> for LedgerKey {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

/// Prepend `prefix` to `key`.
pub fn append_prefix(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + key.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(key);
    out
}

/// Append the fingerprint to a signer-prefixed key.
pub fn append_fingerprint(fingerprint: &Fingerprint, signer_key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(signer_key.len() + 1 + fingerprint.as_bytes().len());
    out.extend_from_slice(signer_key);
    out.push(SIGNER_SEPARATOR);
    out.extend_from_slice(fingerprint.as_bytes());
    out
}

/// Build the lookup key for a fingerprint, optionally scoped to a signer.
pub fn build_key(fingerprint: &Fingerprint, signer: Option<&SignerId>) -> LedgerKey {
    match signer {
        None => LedgerKey(fingerprint.as_bytes().to_vec()),
        Some(s) => {
            let scoped = append_prefix(SIGNER_PREFIX, s.as_bytes());
            LedgerKey(append_fingerprint(fingerprint, &scoped))
        }
    }
}

/// Move a key into the date-range partition.
///
/// Only unscoped keys are re-partitioned; signer-scoped keys already carry their own
/// index and are returned unchanged.
pub fn build_range_key(key: LedgerKey, has_signer: bool) -> LedgerKey {
    if has_signer {
        key
    } else {
        LedgerKey(append_prefix(DATE_RANGE_PREFIX, &key.0))
    }
}
