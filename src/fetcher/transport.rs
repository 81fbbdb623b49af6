use std::time::Duration;

use async_trait::async_trait;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{AppError, Result};

/// Status and body of one completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// The single network seam of the API client. Errors returned here are
/// transport-level failures and are retried with backoff.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(&'static str, String)],
    ) -> Result<HttpResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(&'static str, String)],
    ) -> Result<HttpResponse> {
        let mut req = self.client.get(url).query(query);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Transient(format!("GET {url}: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Transient(format!("GET {url}: reading body: {e}")))?;
        Ok(HttpResponse { status, body })
    }
}
