//! Caller identities.
//!
//! A principal is resolved once at call entry and then matched on; the pipeline never
//! re-inspects which kind of user it is running for.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::gateway_url;

/// The authenticated party an invocation runs as.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    /// Platform account; ledger access goes through the default endpoint.
    Standard(StandardUser),
    /// Ledger-scoped API key bound to a specific ledger endpoint.
    Ledger(LedgerUser),
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardUser {
    pub email: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerUser {
    pub api_key: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tls: bool,
    /// Path prefix of the gateway API, empty when it is served at the root.
    #[serde(default)]
    pub api_path: String,
}

impl LedgerUser {
    pub fn new(api_key: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            api_key: api_key.into(),
            host: host.into(),
            port,
            tls: false,
            api_path: String::new(),
        }
    }

    /// Base URL of the ledger gateway.
    pub fn endpoint(&self) -> String {
        gateway_url(self.tls, &self.host, self.port, &self.api_path)
    }
}

impl Principal {
    /// Credential to present to remote services, if any.
    pub fn credential(&self) -> Option<&str> {
        match self {
            Self::Standard(u) => u.token.as_deref(),
            Self::Ledger(u) => Some(u.api_key.as_str()),
        }
    }

    /// Short human label for summaries.
    pub fn label(&self) -> String {
        match self {
            Self::Standard(u) => u.email.clone(),
            Self::Ledger(u) => format!("api key on {}:{}", u.host, u.port),
        }
    }
}

fn redact(secret: &str) -> String {
    let n = secret.chars().count();
    if n <= 4 {
        "****".to_string()
    } else {
        let tail: String = secret.chars().skip(n - 4).collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for StandardUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardUser")
            .field("email", &self.email)
            .field("token", &self.token.as_deref().map(redact))
            .finish()
    }
}

impl fmt::Debug for LedgerUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerUser")
            .field("api_key", &redact(&self.api_key))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("api_path", &self.api_path)
            .finish()
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(u) => f.debug_tuple("Standard").field(u).finish(),
            Self::Ledger(u) => f.debug_tuple("Ledger").field(u).finish(),
        }
    }
}
