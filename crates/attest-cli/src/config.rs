//! Config file loading and principal resolution.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use attest_core::config::{validate_config, CoreConfig};
use attest_core::principal::{LedgerUser, Principal};

use crate::args::LedgerArgs;

/// Load `path`; a missing file yields the defaults.
pub fn load(path: &Path) -> Result<CoreConfig> {
    let cfg = if path.exists() {
        let raw = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))?
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        CoreConfig::default()
    };
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Apply inline ledger flags and pick the principal for this invocation.
///
/// An inline API key always wins over the configured context and is never written back.
pub fn resolve(cfg: &mut CoreConfig, inline: &LedgerArgs) -> Option<Principal> {
    if let Some(h) = &inline.lc_host {
        cfg.ledger.host = h.clone();
    }
    if let Some(p) = inline.lc_port {
        cfg.ledger.port = p;
    }
    if inline.lc_tls {
        cfg.ledger.tls = true;
    }

    match &inline.lc_api_key {
        Some(key) => {
            let mut user = LedgerUser::new(key.clone(), cfg.ledger.host.clone(), cfg.ledger.port);
            user.tls = cfg.ledger.tls;
            user.api_path = cfg.ledger.api_path.clone();
            Some(Principal::Ledger(user))
        }
        None => cfg.current_principal().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_core::principal::StandardUser;
    use std::io::Write;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(&dir.path().join("config.json")).unwrap();
        assert_eq!(cfg.ledger.port, 3324);
    }

    #[test]
    fn loads_contexts() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{
                "ledger": {{"host": "ledger.internal"}},
                "current_context": "ci",
                "contexts": {{"ci": {{"kind": "ledger", "api_key": "k1", "host": "10.0.0.1", "port": 443, "tls": true}}}}
            }}"#
        )
        .unwrap();
        let mut cfg = load(f.path()).unwrap();
        let p = resolve(&mut cfg, &LedgerArgs::default()).unwrap();
        assert!(matches!(p, Principal::Ledger(ref u) if u.host == "10.0.0.1" && u.tls));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"limits": {{"max_concurrent_fetches": 0}}}}"#).unwrap();
        assert!(load(f.path()).is_err());
    }

    #[test]
    fn inline_api_key_overrides_context() {
        let mut cfg = CoreConfig::default();
        cfg.contexts.insert(
            "me".into(),
            Principal::Standard(StandardUser {
                email: "me@example.com".into(),
                token: None,
            }),
        );
        cfg.current_context = Some("me".into());

        let inline = LedgerArgs {
            lc_host: Some("lc.example.com".into()),
            lc_port: Some(443),
            lc_api_key: Some("secret".into()),
            lc_tls: true,
        };
        match resolve(&mut cfg, &inline) {
            Some(Principal::Ledger(u)) => {
                assert_eq!(u.endpoint(), "https://lc.example.com:443");
                assert_eq!(u.api_key, "secret");
            }
            other => panic!("unexpected principal: {other:?}"),
        }

        assert!(matches!(
            resolve(&mut cfg, &LedgerArgs::default()),
            Some(Principal::Standard(_))
        ));
    }

    #[test]
    fn inline_api_key_keeps_configured_api_path() {
        let mut cfg = CoreConfig::default();
        cfg.ledger.api_path = "api".into();
        let inline = LedgerArgs {
            lc_api_key: Some("secret".into()),
            ..LedgerArgs::default()
        };
        match resolve(&mut cfg, &inline) {
            Some(Principal::Ledger(u)) => assert_eq!(u.endpoint(), cfg.ledger.endpoint()),
            other => panic!("unexpected principal: {other:?}"),
        }
    }
}
