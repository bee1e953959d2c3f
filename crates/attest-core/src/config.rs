//! Configuration structures for attest-core.
//!
//! Configuration is explicit and serializable. The core crate does not read environment
//! variables or files; the CLI loads a config document and passes it in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{AttestError, AttestResult};
use crate::principal::Principal;

/// Global configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub ledger: LedgerConfig,
    pub platform: PlatformConfig,
    pub limits: LimitsConfig,
    /// Name of the active entry in `contexts`.
    pub current_context: Option<String>,
    pub contexts: BTreeMap<String, Principal>,
}

impl CoreConfig {
    /// Principal of the current context, if one is selected.
    pub fn current_principal(&self) -> Option<&Principal> {
        self.current_context
            .as_ref()
            .and_then(|name| self.contexts.get(name))
    }
}

/// Default ledger gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    /// Path prefix of the gateway API, e.g. `api` when served behind a proxy.
    pub api_path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3324,
            tls: false,
            api_path: String::new(),
        }
    }
}

impl LedgerConfig {
    /// Base URL of the gateway.
    pub fn endpoint(&self) -> String {
        gateway_url(self.tls, &self.host, self.port, &self.api_path)
    }
}

pub(crate) fn gateway_url(tls: bool, host: &str, port: u16, api_path: &str) -> String {
    let scheme = if tls { "https" } else { "http" };
    let path = api_path.trim_matches('/');
    if path.is_empty() {
        format!("{scheme}://{host}:{port}")
    } else {
        format!("{scheme}://{host}:{port}/{path}")
    }
}

/// Platform metadata API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub base_url: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.codenotary.io/foundation/v1".to_string(),
        }
    }
}

/// Per-invocation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Deadline for a whole invocation; 0 disables it.
    pub deadline_ms: u64,
    /// Concurrent platform metadata fetches per batch.
    pub max_concurrent_fetches: usize,
    /// Exit code for a trusted `verify` when none is given on the command line.
    pub default_exit_code: Option<i32>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 60_000,
            max_concurrent_fetches: 8,
            default_exit_code: None,
        }
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &CoreConfig) -> AttestResult<()> {
    if cfg.ledger.host.trim().is_empty() {
        return Err(AttestError::invalid_params("ledger host must not be empty"));
    }

    if cfg.ledger.port == 0 {
        return Err(AttestError::invalid_params("ledger port must be non-zero"));
    }

    if cfg.limits.max_concurrent_fetches == 0 {
        return Err(AttestError::invalid_params(
            "max_concurrent_fetches must be greater than zero",
        ));
    }

    if !cfg.platform.base_url.starts_with("http://") && !cfg.platform.base_url.starts_with("https://") {
        return Err(AttestError::invalid_params(format!(
            "platform base_url must be an http(s) url: {}",
            cfg.platform.base_url
        )));
    }

    if let Some(name) = &cfg.current_context {
        if !cfg.contexts.contains_key(name) {
            return Err(AttestError::invalid_params(format!(
                "current context {name:?} is not defined"
            )));
        }
    }

    Ok(())
}
