pub mod handle;
pub mod memory;
pub mod path;
pub mod rest;
pub mod sqlite;
pub mod tree;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use handle::StoreHandle;
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// A slash-addressed JSON tree. Paths reaching a backend are already sanitized.
#[async_trait]
pub trait HierarchicalStore: Send + Sync {
    /// Subtree at `path`, or `None` when nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Replace the subtree at `path`.
    async fn set(&self, path: &str, value: &Value) -> Result<()>;

    /// Set each child key of `partial` under `path`, leaving siblings alone.
    async fn update(&self, path: &str, partial: &serde_json::Map<String, Value>) -> Result<()>;

    /// Store `value` under a generated, time-ordered child key and return the key.
    async fn push(&self, path: &str, value: &Value) -> Result<String>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Drop and re-establish the underlying connection.
    async fn reconnect(&self) -> Result<()> {
        Ok(())
    }
}
