//! Process-wide store connection with an explicit lifecycle.
//!
//! The handle is created unconnected; the first operation (or an explicit
//! `initialize`) opens the backend selected by the store URL. After a failure
//! the owner calls `reinitialize` to tear the connection down and open it again.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::path::{join, sanitize};
use super::{HierarchicalStore, MemoryStore, RestStore, SqliteStore};
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
struct StoreSettings {
    url: String,
    credential: Option<String>,
}

pub struct StoreHandle {
    settings: Option<StoreSettings>,
    backend: RwLock<Option<Arc<dyn HierarchicalStore>>>,
}

impl StoreHandle {
    /// Unconnected handle; the backend opens lazily.
    pub fn new(url: &str, credential: Option<&str>) -> Self {
        Self {
            settings: Some(StoreSettings {
                url: url.to_string(),
                credential: credential.map(str::to_string),
            }),
            backend: RwLock::new(None),
        }
    }

    /// Handle around an already-open backend. `reinitialize` asks it to reconnect.
    pub fn from_backend(backend: Arc<dyn HierarchicalStore>) -> Self {
        Self {
            settings: None,
            backend: RwLock::new(Some(backend)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    pub async fn is_initialized(&self) -> bool {
        self.backend.read().await.is_some()
    }

    /// Open the backend if it is not open yet. Safe to call repeatedly.
    pub async fn initialize(&self) -> Result<()> {
        self.backend().await.map(|_| ())
    }

    /// Drop the current connection and open a new one.
    pub async fn reinitialize(&self) -> Result<()> {
        let Some(settings) = &self.settings else {
            let current = self.backend.read().await.clone();
            return match current {
                Some(backend) => backend.reconnect().await,
                None => Err(AppError::StoreUnavailable("store handle has no backend".to_string())),
            };
        };

        let mut slot = self.backend.write().await;
        slot.take();
        warn!("Reinitializing store connection to {}", settings.url);
        *slot = Some(open_backend(settings).await?);
        Ok(())
    }

    async fn backend(&self) -> Result<Arc<dyn HierarchicalStore>> {
        if let Some(backend) = self.backend.read().await.as_ref() {
            return Ok(Arc::clone(backend));
        }

        let mut slot = self.backend.write().await;
        if let Some(backend) = slot.as_ref() {
            return Ok(Arc::clone(backend));
        }
        let settings = self
            .settings
            .as_ref()
            .ok_or_else(|| AppError::StoreUnavailable("store handle has no backend".to_string()))?;
        let backend = open_backend(settings).await?;
        *slot = Some(Arc::clone(&backend));
        Ok(backend)
    }

    pub async fn get(&self, path: &str) -> Result<Option<Value>> {
        self.backend().await?.get(&sanitize(path)).await
    }

    pub async fn set(&self, path: &str, value: &Value) -> Result<()> {
        self.backend().await?.set(&sanitize(path), value).await
    }

    pub async fn update(&self, path: &str, partial: &Map<String, Value>) -> Result<()> {
        let path = sanitize(path);
        let mut clean = Map::with_capacity(partial.len());
        for (key, value) in partial {
            let key = sanitize(key);
            if key.is_empty() {
                return Err(AppError::StoreUnavailable(format!("empty update key under {path}")));
            }
            clean.insert(key, value.clone());
        }
        self.backend().await?.update(&path, &clean).await
    }

    pub async fn push(&self, path: &str, value: &Value) -> Result<String> {
        self.backend().await?.push(&sanitize(path), value).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.backend().await?.delete(&sanitize(path)).await
    }

    /// Typed read; a missing node is `Ok(None)`.
    pub async fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.get(path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn set_as<T: Serialize>(&self, path: &str, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.set(path, &value).await
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.get(path).await?.is_some())
    }

    /// Child path helper that keeps sanitization in one place.
    pub fn child(base: &str, key: &str) -> String {
        join(&sanitize(base), &sanitize(key))
    }
}

async fn open_backend(settings: &StoreSettings) -> Result<Arc<dyn HierarchicalStore>> {
    let url = settings.url.as_str();
    let backend: Arc<dyn HierarchicalStore> = if url == "memory:" {
        Arc::new(MemoryStore::new())
    } else if url.starts_with("sqlite:") {
        Arc::new(SqliteStore::connect(url).await?)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Arc::new(RestStore::new(url, settings.credential.as_deref())?)
    } else {
        return Err(AppError::Config(format!(
            "unsupported STORE_URL '{url}' (expected memory:, sqlite: or http(s)://)"
        )));
    };
    info!("Store backend opened for {url}");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn opens_lazily_and_sanitizes_paths() {
        let handle = StoreHandle::new("memory:", None);
        assert!(!handle.is_initialized().await);

        handle.set("/h2h//m.1/", &json!({"draws": 0})).await.unwrap();
        assert!(handle.is_initialized().await);
        assert_eq!(handle.get("h2h/m_1").await.unwrap(), Some(json!({"draws": 0})));
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let handle = StoreHandle::new("memory:", None);
        handle.initialize().await.unwrap();
        handle.set("a", &json!(1)).await.unwrap();
        handle.initialize().await.unwrap();
        assert_eq!(handle.get("a").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn reinitialize_opens_a_fresh_connection() {
        let handle = StoreHandle::new("memory:", None);
        handle.set("a", &json!(1)).await.unwrap();
        handle.reinitialize().await.unwrap();
        // A fresh in-memory backend starts empty.
        assert_eq!(handle.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_backend_survives_reinitialize() {
        let handle = StoreHandle::in_memory();
        handle.set("a", &json!(1)).await.unwrap();
        handle.reinitialize().await.unwrap();
        assert_eq!(handle.get("a").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn unknown_scheme_is_a_configuration_error() {
        let handle = StoreHandle::new("ftp://nowhere", None);
        let err = handle.initialize().await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn typed_helpers_round_trip() {
        let handle = StoreHandle::in_memory();
        handle.set_as("health/h2h", &json!({"status": "success"})).await.unwrap();
        let back: Option<Value> = handle.get_as("health/h2h").await.unwrap();
        assert_eq!(back, Some(json!({"status": "success"})));
        assert!(handle.exists("health/h2h").await.unwrap());
        assert!(!handle.exists("health/team_stats").await.unwrap());
    }
}
