//! HTTP/JSON client for the ledger gateway.
//!
//! Each `LedgerReader` call becomes one POST. The invocation deadline is applied as the
//! request timeout. Gateway status names are mapped onto `LedgerError` so that resource
//! exhaustion, missing keys and failed integrity checks stay distinguishable from
//! transport failures. No retries happen here.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use attest_core::errors::LedgerError;
use attest_core::model::{RawItem, VerifiedItem};
use attest_core::ports::{CallContext, HistoryQuery, LedgerReader, ScoreScan, SetScan};
use attest_core::principal::LedgerUser;

use crate::constants::{
    API_KEY_HEADER, CLIENT_VERSION, PLUGIN_TYPE_HEADER, PLUGIN_TYPE_VALUE, ROUTE_HISTORY, ROUTE_VERIFIED_GET,
    ROUTE_ZSCAN,
};
use crate::request::{GatewayError, HistoryRequest, ItemList, VerifiedEntry, VerifiedGetRequest, ZScanRequest};

#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    base: Url,
    api_key: Option<String>,
    http: Client,
}

impl HttpLedgerClient {
    /// Client for the gateway at `base_url` (e.g. `http://localhost:3324`).
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("invalid ledger url: {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .user_agent(format!("attest-ledger-client/{CLIENT_VERSION}"))
            .build()
            .map_err(|e| anyhow!("http client: {e}"))?;
        Ok(Self { base, api_key, http })
    }

    /// Client bound to a ledger-scoped user's endpoint and key.
    pub fn for_user(user: &LedgerUser) -> Result<Self> {
        Self::new(&user.endpoint(), Some(user.api_key.clone()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        route: &str,
        body: &B,
    ) -> Result<T, LedgerError> {
        if ctx.is_expired() {
            return Err(LedgerError::DeadlineExceeded);
        }
        let url = self
            .base
            .join(route)
            .map_err(|e| LedgerError::transport(format!("bad route {route}: {e}")))?;

        let mut req = self
            .http
            .post(url)
            .header(PLUGIN_TYPE_HEADER, PLUGIN_TYPE_VALUE)
            .json(body);
        if let Some(k) = &self.api_key {
            req = req.header(API_KEY_HEADER, k);
        }
        if let Some(t) = ctx.remaining() {
            req = req.timeout(t);
        }

        debug!(route, "ledger request");
        let resp = req.send().await.map_err(map_reqwest)?;
        let status = resp.status();
        if status.is_success() {
            return resp.json::<T>().await.map_err(map_reqwest);
        }

        let body: GatewayError = resp.json().await.unwrap_or(GatewayError {
            code: String::new(),
            message: String::new(),
        });
        Err(map_status(status, body))
    }
}

fn map_reqwest(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::DeadlineExceeded
    } else {
        LedgerError::transport(e.to_string())
    }
}

/// Map a non-success gateway response.
pub fn map_status(status: StatusCode, body: GatewayError) -> LedgerError {
    match body.code.as_str() {
        "ResourceExhausted" => return LedgerError::ResourceExhausted(body.message),
        "NotFound" => return LedgerError::NotFound,
        "NotVerified" | "DataLoss" => return LedgerError::NotVerified,
        "DeadlineExceeded" => return LedgerError::DeadlineExceeded,
        _ => {}
    }
    match status {
        StatusCode::TOO_MANY_REQUESTS => LedgerError::ResourceExhausted(body.message),
        StatusCode::NOT_FOUND => LedgerError::NotFound,
        StatusCode::CONFLICT => LedgerError::NotVerified,
        StatusCode::GATEWAY_TIMEOUT => LedgerError::DeadlineExceeded,
        other => LedgerError::transport(format!("ledger gateway returned {other}: {}", body.message)),
    }
}

#[async_trait]
impl LedgerReader for HttpLedgerClient {
    async fn scan_by_set(&self, ctx: &CallContext, scan: &SetScan) -> Result<Vec<RawItem>, LedgerError> {
        let list: ItemList = self
            .post(ctx, ROUTE_ZSCAN, &ZScanRequest::from_set_scan(scan))
            .await?;
        Ok(list.items.into_iter().map(RawItem::from).collect())
    }

    async fn scan_by_score(&self, ctx: &CallContext, scan: &ScoreScan) -> Result<Vec<RawItem>, LedgerError> {
        let list: ItemList = self
            .post(ctx, ROUTE_ZSCAN, &ZScanRequest::from_score_scan(scan))
            .await?;
        Ok(list.items.into_iter().map(RawItem::from).collect())
    }

    async fn history_of(&self, ctx: &CallContext, query: &HistoryQuery) -> Result<Vec<RawItem>, LedgerError> {
        let list: ItemList = self
            .post(ctx, ROUTE_HISTORY, &HistoryRequest::from_query(query))
            .await?;
        Ok(list.items.into_iter().map(RawItem::from).collect())
    }

    async fn verified_get(&self, ctx: &CallContext, key: &[u8]) -> Result<VerifiedItem, LedgerError> {
        let entry: VerifiedEntry = self
            .post(ctx, ROUTE_VERIFIED_GET, &VerifiedGetRequest { key: key.to_vec() })
            .await?;
        Ok(VerifiedItem {
            item: entry.item.into(),
            verified: entry.verified,
        })
    }
}
