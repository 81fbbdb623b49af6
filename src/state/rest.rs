use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::HierarchicalStore;
use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{AppError, Result};

/// Realtime-database REST backend: `{base}/{path}.json?auth=<token>`.
pub struct RestStore {
    base_url: String,
    auth_token: Option<String>,
    client: RwLock<reqwest::Client>,
}

impl RestStore {
    pub fn new(base_url: &str, credential: Option<&str>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: credential.and_then(auth_token_from_credential),
            client: RwLock::new(build_client()?),
        })
    }

    fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let client = self.client.read().await.clone();
        let mut req = client.request(method.clone(), self.node_url(path));
        if let Some(token) = &self.auth_token {
            req = req.query(&[("auth", token.as_str())]);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            AppError::StoreUnavailable(format!("{method} {path}: {e}"))
        })?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            AppError::StoreUnavailable(format!("{method} {path}: reading body: {e}"))
        })?;
        debug!("store {method} {path} → {status}");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::Config(format!("store rejected credential ({status}) for {path}")));
        }
        if !status.is_success() {
            return Err(AppError::StoreUnavailable(format!("{method} {path}: status={status} body={text}")));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?)
}

/// Accepts either a raw token or a JSON blob carrying one.
pub fn auth_token_from_credential(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(obj)) => ["auth_token", "database_secret", "token"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string),
        Ok(Value::String(s)) => Some(s),
        _ => Some(raw.to_string()),
    }
}

#[async_trait]
impl HierarchicalStore for RestStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let value = self.send(Method::GET, path, None).await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn set(&self, path: &str, value: &Value) -> Result<()> {
        self.send(Method::PUT, path, Some(value)).await?;
        Ok(())
    }

    async fn update(&self, path: &str, partial: &Map<String, Value>) -> Result<()> {
        let body = Value::Object(partial.clone());
        self.send(Method::PATCH, path, Some(&body)).await?;
        Ok(())
    }

    async fn push(&self, path: &str, value: &Value) -> Result<String> {
        let resp = self.send(Method::POST, path, Some(value)).await?;
        resp.get("name")
            .and_then(|n| n.as_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::StoreUnavailable(format!("push to {path} returned no key")))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        *self.client.write().await = build_client()?;
        Ok(())
    }
}
