//! HTTP client for the platform artifact API.
//!
//! Metadata is read with `GET {base}/artifact/{fingerprint}?metahash={meta_hash}`. A
//! bearer token is attached when the principal has one. The remaining invocation budget
//! is used as the request timeout.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use attest_core::errors::PlatformError;
use attest_core::model::{ArtifactMetadata, Fingerprint};
use attest_core::ports::{CallContext, PlatformReader};

#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    base: Url,
    token: Option<String>,
    http: Client,
}

impl HttpPlatformClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("invalid platform url: {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .user_agent(concat!("attest-platform-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow!("http client: {e}"))?;
        Ok(Self { base, token, http })
    }

    /// URL of the metadata resource for one ledger entry.
    pub fn artifact_url(&self, fingerprint: &Fingerprint, meta_hash: &str) -> Result<Url, PlatformError> {
        let mut url = self
            .base
            .join(&format!("artifact/{}", fingerprint.as_str()))
            .map_err(|e| PlatformError::transport(format!("bad artifact url: {e}")))?;
        url.query_pairs_mut().append_pair("metahash", meta_hash);
        Ok(url)
    }
}

/// Map a non-success platform response.
pub fn map_status(status: StatusCode) -> PlatformError {
    match status.as_u16() {
        404 => PlatformError::NotFound,
        // 419 is the platform's "session expired"
        401 | 403 | 419 => PlatformError::Unauthorized(status.as_u16()),
        408 | 504 => PlatformError::DeadlineExceeded,
        other => PlatformError::transport(format!("platform returned status {other}")),
    }
}

fn map_reqwest(e: reqwest::Error) -> PlatformError {
    if e.is_timeout() {
        PlatformError::DeadlineExceeded
    } else {
        PlatformError::transport(e.to_string())
    }
}

#[async_trait]
impl PlatformReader for HttpPlatformClient {
    async fn fetch_metadata(
        &self,
        ctx: &CallContext,
        fingerprint: &Fingerprint,
        meta_hash: &str,
    ) -> Result<ArtifactMetadata, PlatformError> {
        if ctx.is_expired() {
            return Err(PlatformError::DeadlineExceeded);
        }
        let url = self.artifact_url(fingerprint, meta_hash)?;
        let mut req = self.http.get(url);
        if let Some(t) = &self.token {
            req = req.bearer_auth(t);
        }
        if let Some(t) = ctx.remaining() {
            req = req.timeout(t);
        }

        debug!(fingerprint = fingerprint.as_str(), meta_hash, "platform metadata request");
        let resp = req.send().await.map_err(map_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(map_status(status));
        }
        resp.json::<ArtifactMetadata>().await.map_err(map_reqwest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_url_carries_meta_hash() {
        let c = HttpPlatformClient::new("https://api.example.com/foundation/v1", None).unwrap();
        let fp = Fingerprint::new("ABC123").unwrap();
        let url = c.artifact_url(&fp, "m 1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/foundation/v1/artifact/abc123?metahash=m+1"
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(map_status(StatusCode::NOT_FOUND), PlatformError::NotFound);
        assert_eq!(map_status(StatusCode::UNAUTHORIZED), PlatformError::Unauthorized(401));
        assert_eq!(
            map_status(StatusCode::from_u16(419).unwrap()),
            PlatformError::Unauthorized(419)
        );
        assert_eq!(map_status(StatusCode::GATEWAY_TIMEOUT), PlatformError::DeadlineExceeded);
        assert!(matches!(
            map_status(StatusCode::INTERNAL_SERVER_ERROR),
            PlatformError::Transport(_)
        ));
    }

    #[test]
    fn rejects_bad_url() {
        assert!(HttpPlatformClient::new("::", None).is_err());
    }
}
