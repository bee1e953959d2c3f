//! Inspect and verify against the in-memory ledger and platform.

use assert_matches::assert_matches;
use serde_json::json;

use attest_core::config::LimitsConfig;
use attest_core::engine::Engine;
use attest_core::errors::{ItemError, PlatformError};
use attest_core::keys::{build_key, build_range_key};
use attest_core::model::{ArtifactMetadata, Fingerprint, SignerId, Status};
use attest_core::outcome::Verdict;
use attest_core::plan::QueryParams;
use attest_core::AttestError;
use attest_ledger_client::MemoryLedger;
use attest_platform_client::MemoryPlatform;

const HASH: &str = "abc123";

// 2024-01-01T12:00Z, 2024-01-05T12:00Z, 2024-01-10T12:00Z
const T1: i64 = 1_704_110_400;
const T2: i64 = 1_704_456_000;
const T3: i64 = 1_704_888_000;

fn fp() -> Fingerprint {
    Fingerprint::new(HASH).unwrap()
}

fn payload(meta_hash: &str, status: &str, level: i64, signer: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "hash": HASH,
        "metaHash": meta_hash,
        "status": status,
        "level": level,
        "signer": signer,
        "name": "app.tar.gz",
    }))
    .unwrap()
}

fn meta(status: &str, level: i64) -> ArtifactMetadata {
    ArtifactMetadata {
        status: status.to_string(),
        level,
        name: Some("app.tar.gz".to_string()),
        attachments: Vec::new(),
        revoked: None,
    }
}

fn score(ts: i64) -> f64 {
    ts as f64 * 1e9
}

/// Write one notarization the way a notarizing client indexes it.
fn notarize(ledger: &MemoryLedger, signer: &str, meta_hash: &str, status: &str, ts: i64) {
    let fp = fp();
    let signer_id = SignerId::parse(signer).unwrap();
    let key = build_key(&fp, Some(&signer_id));
    let unscoped = build_key(&fp, None);
    let range_set = build_range_key(unscoped.clone(), false);

    ledger
        .set_at(key.as_bytes(), &payload(meta_hash, status, 0, signer), ts)
        .unwrap();
    ledger.zadd(unscoped.as_bytes(), score(ts), key.as_bytes()).unwrap();
    ledger.zadd(range_set.as_bytes(), score(ts), key.as_bytes()).unwrap();
    ledger.zadd(key.as_bytes(), score(ts), key.as_bytes()).unwrap();
}

/// Three notarizations by two signers, all trusted on both sides.
fn seeded() -> (MemoryLedger, MemoryPlatform) {
    let ledger = MemoryLedger::default();
    let platform = MemoryPlatform::new();
    notarize(&ledger, "alice", "m1", "TRUSTED", T1);
    notarize(&ledger, "bob", "m2", "TRUSTED", T2);
    notarize(&ledger, "alice", "m3", "TRUSTED", T3);
    for m in ["m1", "m2", "m3"] {
        platform.insert(&fp(), m, meta("TRUSTED", 0));
    }
    (ledger, platform)
}

fn meta_hashes(report: &attest_core::aggregate::InspectReport) -> Vec<String> {
    report
        .results
        .iter()
        .map(|r| r.record.as_ref().map(|x| x.meta_hash.clone()).unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn last_n_returns_newest_first() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.last = 2;
    let report = engine.inspect(&params).await.unwrap();

    assert_eq!(report.strategy, "signer-scan");
    assert!(report.descending);
    assert_eq!(meta_hashes(&report), vec!["m3", "m2"]);
    assert_eq!(report.summary.with_errors, 0);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn first_n_returns_oldest_first() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.first = 2;
    let report = engine.inspect(&params).await.unwrap();

    assert!(!report.descending);
    assert_eq!(meta_hashes(&report), vec!["m1", "m2"]);
}

#[tokio::test]
async fn signer_history_is_scoped() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.signer = SignerId::parse("alice");
    let report = engine.inspect(&params).await.unwrap();
    assert_eq!(report.strategy, "history-scan");
    assert_eq!(meta_hashes(&report), vec!["m1", "m3"]);

    params.last = 1;
    let report = engine.inspect(&params).await.unwrap();
    assert_eq!(meta_hashes(&report), vec!["m3"]);
}

#[tokio::test]
async fn unknown_signer_history_is_empty() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.signer = SignerId::parse("nobody");
    let report = engine.inspect(&params).await.unwrap();

    assert_eq!(report.strategy, "history-scan");
    assert_eq!(report.total(), 0);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn date_range_without_signer() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.start = Some("2024-01-02".into());
    params.end = Some("2024-01-09".into());
    let report = engine.inspect(&params).await.unwrap();

    assert_eq!(report.strategy, "time-range-scan");
    assert_eq!(meta_hashes(&report), vec!["m2"]);
}

#[tokio::test]
async fn date_range_with_signer_and_last() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.signer = SignerId::parse("alice");
    params.start = Some("2024-01-01".into());
    params.last = 1;
    let report = engine.inspect(&params).await.unwrap();

    assert!(report.descending);
    assert_eq!(meta_hashes(&report), vec!["m3"]);
}

#[tokio::test]
async fn status_divergence_is_reported_per_row() {
    let (ledger, platform) = seeded();
    platform.insert(&fp(), "m2", meta("UNTRUSTED", 0));
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.first = 3;
    let report = engine.inspect(&params).await.unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.summary.mismatched, 1);
    assert!(report.results[0].errors.is_empty());
    assert_matches!(
        report.results[1].errors.as_slice(),
        [ItemError::StatusMismatch { ledger, platform }] if ledger == "TRUSTED" && platform == "UNTRUSTED"
    );
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn malformed_entry_does_not_drop_its_neighbours() {
    let (ledger, platform) = seeded();
    let garbage_key = b"vcn.mallory.abc123";
    ledger.set_at(garbage_key, b"not json", T3 + 60).unwrap();
    ledger.zadd(HASH.as_bytes(), score(T3 + 60), garbage_key).unwrap();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let report = engine.inspect(&QueryParams::new(fp())).await.unwrap();

    assert_eq!(report.total(), 4);
    assert_eq!(report.summary.malformed, 1);
    assert!(report.results[3].record.is_none());
    assert_matches!(report.results[3].errors.as_slice(), [ItemError::MalformedItem(_)]);
}

#[tokio::test]
async fn platform_outage_keeps_ledger_records() {
    let (ledger, platform) = seeded();
    platform.fail_with(Some(PlatformError::Unauthorized(401)));
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let report = engine.inspect(&QueryParams::new(fp())).await.unwrap();

    assert_eq!(report.total(), 3);
    assert!(report.results.iter().all(|r| r.record.is_some() && r.metadata.is_none()));
    assert!(report
        .results
        .iter()
        .all(|r| matches!(r.errors.as_slice(), [ItemError::MetadataFetch(PlatformError::Unauthorized(401))])));
}

#[tokio::test]
async fn tampered_scan_entry_is_critical() {
    let (ledger, platform) = seeded();
    let bob = build_key(&fp(), SignerId::parse("bob").as_ref());
    let bob_tx = ledger.verified_read(bob.as_bytes()).unwrap().item.tx;
    assert!(ledger.tamper(bob_tx, &payload("m2", "TRUSTED", 0, "mallory")));
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.first = 3;
    let report = engine.inspect(&params).await.unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.summary.not_verified, 1);
    assert_eq!(report.summary.mismatched, 0);
    assert_matches!(report.results[1].errors.as_slice(), [ItemError::NotVerified]);
    assert_eq!(report.exit_code(), 2);
}

#[tokio::test]
async fn oversized_unbounded_query_is_exhausted() {
    let ledger = MemoryLedger::new(2);
    let platform = MemoryPlatform::new();
    notarize(&ledger, "alice", "m1", "TRUSTED", T1);
    notarize(&ledger, "bob", "m2", "TRUSTED", T2);
    notarize(&ledger, "carol", "m3", "TRUSTED", T3);
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let err = engine.inspect(&QueryParams::new(fp())).await.unwrap_err();
    assert_matches!(err, AttestError::ResourceExhausted(_));
    assert!(err.to_string().contains("--first or --last"));

    let mut params = QueryParams::new(fp());
    params.last = 2;
    assert_eq!(engine.inspect(&params).await.unwrap().total(), 2);
}

#[tokio::test]
async fn conflicting_pagination_fails_before_io() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let mut params = QueryParams::new(fp());
    params.first = 1;
    params.last = 1;
    assert_matches!(engine.inspect(&params).await, Err(AttestError::InvalidParams(_)));

    let mut params = QueryParams::new(fp());
    params.start = Some("01/02/2024".into());
    assert_matches!(
        engine.inspect(&params).await,
        Err(AttestError::InvalidDateFormat { .. })
    );
}

#[tokio::test]
async fn verify_latest_signer_entry() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());
    let alice = SignerId::parse("alice");

    let outcome = engine.verify(&fp(), alice.as_ref()).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Notarized);
    assert_eq!(outcome.status, Status::Trusted);
    assert_eq!(outcome.record().map(|r| r.meta_hash.as_str()), Some("m3"));
    assert_eq!(outcome.exit_code(None), 0);
    assert_eq!(outcome.exit_code(Some(42)), 42);
}

#[tokio::test]
async fn verify_unknown_artifact() {
    let (ledger, platform) = seeded();
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());
    let nobody = SignerId::parse("nobody");

    let outcome = engine.verify(&fp(), nobody.as_ref()).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::NotNotarized);
    assert_eq!(outcome.exit_code(Some(42)), Status::Unknown.code());
}

#[tokio::test]
async fn verify_tampered_entry_is_compromised() {
    let (ledger, platform) = seeded();
    let alice = SignerId::parse("alice");
    let key = build_key(&fp(), alice.as_ref());
    let latest = ledger.verified_read(key.as_bytes()).unwrap().item.tx;
    assert!(ledger.tamper(latest, &payload("m3", "TRUSTED", 0, "mallory")));
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());

    let outcome = engine.verify(&fp(), alice.as_ref()).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Compromised);
    assert_eq!(outcome.status, Status::Unknown);
    assert!(outcome.result.is_not_verified());
    assert_eq!(outcome.exit_code(None), 2);
}

#[tokio::test]
async fn verify_revoked_key() {
    let (ledger, platform) = seeded();
    let mut revoked = meta("TRUSTED", 0);
    revoked.revoked = Some(time::OffsetDateTime::from_unix_timestamp(T3 + 1).unwrap());
    platform.insert(&fp(), "m2", revoked);
    let engine = Engine::new(&ledger, &platform, LimitsConfig::default());
    let bob = SignerId::parse("bob");

    let outcome = engine.verify(&fp(), bob.as_ref()).await.unwrap();
    assert_eq!(outcome.status, Status::ApikeyRevoked);
    assert_eq!(outcome.exit_code(Some(7)), 4);
}
