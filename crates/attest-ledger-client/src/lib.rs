//! attest-ledger-client
//!
//! Ledger access for the attest engine.
//!
//! It includes:
//! - wire request/response types for scans, key history and verified reads
//! - an HTTP/JSON gateway client implementing `LedgerReader`
//! - `MemoryLedger`, an in-memory ordered ledger with the same query semantics
//!
//! The gateway endpoint and API key are provided by the caller, usually from a
//! ledger-scoped principal.

pub mod constants;
pub mod http;
pub mod memory;
pub mod request;

pub use constants::*;
pub use http::HttpLedgerClient;
pub use memory::MemoryLedger;
pub use request::{HistoryRequest, ZScanRequest};
