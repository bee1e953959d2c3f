//! attest-core
//!
//! Reconciliation and historical-query engine for notarized artifacts:
//! - ledger key derivation (`keys`) and timestamp score encoding (`score`)
//! - query planning for signer, history and time-range scans (`plan`)
//! - ledger item mapping (`mapper`) and ledger/platform reconciliation (`reconcile`)
//! - ordered result packaging (`aggregate`) and the orchestrating `engine`
//!
//! Network access lives behind the `ports` traits; this crate performs no I/O itself.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod errors;
pub mod keys;
pub mod mapper;
pub mod model;
pub mod outcome;
pub mod plan;
pub mod ports;
pub mod principal;
pub mod reconcile;
pub mod score;

pub use crate::errors::{AttestError, AttestResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::aggregate::{InspectReport, Summary};
    pub use crate::config::CoreConfig;
    pub use crate::engine::Engine;
    pub use crate::errors::{ItemError, LedgerError, PlatformError, Severity};
    pub use crate::model::{ArtifactMetadata, Fingerprint, RawItem, SignerId, Status, VerificationRecord};
    pub use crate::outcome::{Verdict, VerifyOutcome};
    pub use crate::plan::QueryParams;
    pub use crate::ports::{CallContext, LedgerReader, PlatformReader};
    pub use crate::principal::{LedgerUser, Principal, StandardUser};
    pub use crate::reconcile::ReconciledResult;
    pub use crate::{AttestError, AttestResult};
}
