//! Degradation notifications through an incoming webhook.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::{Config, HTTP_TIMEOUT_SECS, NOTIFY_USERNAME};
use crate::error::{AppError, Result};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
    username: &'a str,
}

pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
    username: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
            username: NOTIFY_USERNAME.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        let message = WebhookMessage {
            text,
            username: &self.username,
        };
        let resp = self.client.post(&self.webhook_url).json(&message).send().await?;
        let status = resp.status();
        if status.is_success() {
            debug!("Webhook notification sent");
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            error!("Webhook notification failed: {status} - {body}");
            Err(AppError::Upstream(format!("webhook HTTP {status}: {body}")))
        }
    }
}

/// Used when no webhook is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        debug!("No webhook configured; dropping notification ({} chars)", text.len());
        Ok(())
    }
}

pub fn from_config(cfg: &Config) -> Result<Box<dyn Notifier>> {
    match &cfg.webhook_url {
        Some(url) => {
            info!("Webhook notifications enabled");
            Ok(Box::new(WebhookNotifier::new(url)?))
        }
        None => Ok(Box::new(NoopNotifier)),
    }
}
