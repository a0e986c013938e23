//! HTTP seam between client logic and the network.

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Serialize;
use url::Url;

/// Raw reply from the service, before any interpretation.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal HTTP transport so client logic stays testable without a network.
///
/// Any HTTP status is a successful round trip; `Err` is reserved for
/// transport-level failures (DNS, TLS, timeouts).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json<B: Serialize + Sync>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<TransportReply, anyhow::Error>;
}

/// Production transport backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json<B: Serialize + Sync>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<TransportReply, anyhow::Error> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .context("sending synthesis request")?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .context("reading synthesis response body")?
            .to_vec();
        Ok(TransportReply { status, body })
    }
}
