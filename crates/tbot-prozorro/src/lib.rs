//! ProZorro registry adapter (reqwest).
//!
//! Implements the `tbot-core` [`TenderSource`] port over the public
//! OpenProcurement API:
//! - `GET {base}/tenders?limit=N&descending=1&offset=O`
//! - `GET {base}/tenders/{id}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use tbot_core::{
    config::RegistryConfig,
    errors::Error,
    ports::{PageRequest, TenderSource},
    tender::{TenderEnvelope, TenderPage, TenderRecord},
    Result,
};

#[derive(Clone, Debug)]
pub struct ProzorroClient {
    cfg: RegistryConfig,
    http: reqwest::Client,
}

impl ProzorroClient {
    pub fn new(cfg: RegistryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self { cfg, http })
    }

    fn page_request(&self, req: &PageRequest) -> RequestBuilder {
        let mut query: Vec<(&str, String)> = vec![("limit", req.limit.to_string())];
        if req.descending {
            query.push(("descending", "1".to_string()));
        }
        if let Some(offset) = &req.offset {
            query.push(("offset", offset.as_str().to_string()));
        }
        self.http
            .get(format!("{}/tenders", self.cfg.base_url))
            .query(&query)
    }

    fn tender_request(&self, id: &str) -> RequestBuilder {
        self.http
            .get(format!("{}/tenders/{}", self.cfg.base_url, id))
    }

    /// Run a GET with bounded retries on transient failures (429, 5xx, transport).
    async fn get_json<T: DeserializeOwned>(&self, build: impl Fn() -> RequestBuilder) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            match send_once::<T>(build()).await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < self.cfg.retry_max => {
                    let delay = backoff_delay(self.cfg.retry_backoff, attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max = self.cfg.retry_max,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "registry request failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl TenderSource for ProzorroClient {
    async fn fetch_page(&self, req: &PageRequest) -> Result<TenderPage> {
        self.get_json(|| self.page_request(req)).await
    }

    async fn fetch_tender(&self, id: &str) -> Result<TenderRecord> {
        let env: TenderEnvelope = self.get_json(|| self.tender_request(id)).await?;
        Ok(env.data)
    }
}

async fn send_once<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T> {
    let resp = rb
        .send()
        .await
        .map_err(|e| Error::Network(format!("registry request error: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| Error::Network(format!("registry body error: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Parse(format!("unexpected registry response: {e}")))
}

/// `base * 2^attempt`: 0.5 s, 1 s, 2 s for the default base.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
}
