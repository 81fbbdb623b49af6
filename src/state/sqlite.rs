use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::path::join;
use super::tree::{ancestors, assemble, flatten, push_key};
use super::HierarchicalStore;
use crate::error::Result;

const WITHIN_CLAUSE: &str = "path = ?1 OR substr(path, 1, length(?2)) = ?2";

/// Local store backend: one `nodes` row per leaf, values kept as JSON text.
pub struct SqliteStore {
    url: String,
    pool: RwLock<SqlitePool>,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = open_pool(url).await?;
        info!("SQLite store ready at {url}");
        Ok(Self {
            url: url.to_string(),
            pool: RwLock::new(pool),
        })
    }

    async fn pool(&self) -> SqlitePool {
        self.pool.read().await.clone()
    }

    async fn write(tx: &mut Transaction<'_, Sqlite>, path: &str, value: &Value) -> Result<()> {
        let prefix = subtree_prefix(path);
        sqlx::query(&format!("DELETE FROM nodes WHERE {WITHIN_CLAUSE}"))
            .bind(path)
            .bind(&prefix)
            .execute(&mut **tx)
            .await?;

        for ancestor in ancestors(path) {
            sqlx::query("DELETE FROM nodes WHERE path = ?")
                .bind(ancestor)
                .execute(&mut **tx)
                .await?;
        }

        for (leaf_path, leaf) in flatten(path, value) {
            let encoded = serde_json::to_string(&leaf)?;
            sqlx::query(
                r#"
                INSERT INTO nodes (path, value) VALUES (?, ?)
                ON CONFLICT(path) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(leaf_path)
            .bind(encoded)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

async fn open_pool(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    // Each connection to an in-memory database is its own database.
    let max_connections = if url.contains(":memory:") { 1 } else { 4 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

fn subtree_prefix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{path}/")
    }
}

#[async_trait]
impl HierarchicalStore for SqliteStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let pool = self.pool().await;
        let rows: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT path, value FROM nodes WHERE {WITHIN_CLAUSE} ORDER BY path"
        ))
        .bind(path)
        .bind(subtree_prefix(path))
        .fetch_all(&pool)
        .await?;

        let mut leaves = Vec::with_capacity(rows.len());
        for (leaf_path, raw) in rows {
            leaves.push((leaf_path, serde_json::from_str::<Value>(&raw)?));
        }
        Ok(assemble(path, leaves))
    }

    async fn set(&self, path: &str, value: &Value) -> Result<()> {
        let pool = self.pool().await;
        let mut tx = pool.begin().await?;
        Self::write(&mut tx, path, value).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, path: &str, partial: &Map<String, Value>) -> Result<()> {
        let pool = self.pool().await;
        let mut tx = pool.begin().await?;
        for (key, value) in partial {
            Self::write(&mut tx, &join(path, key), value).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn push(&self, path: &str, value: &Value) -> Result<String> {
        let key = push_key();
        self.set(&join(path, &key), value).await?;
        Ok(key)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let pool = self.pool().await;
        sqlx::query(&format!("DELETE FROM nodes WHERE {WITHIN_CLAUSE}"))
            .bind(path)
            .bind(subtree_prefix(path))
            .execute(&pool)
            .await?;
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        if self.url.contains(":memory:") {
            warn!("Reconnecting an in-memory SQLite store discards its contents");
        }
        let fresh = open_pool(&self.url).await?;
        let stale = std::mem::replace(&mut *self.pool.write().await, fresh);
        stale.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn round_trips_nested_records() {
        let store = memory_store().await;
        let record = json!({
            "id": 10,
            "form": ["W", "D"],
            "goals_stats": {"scored": 3, "per_match_scored": 1.5},
        });
        store.set("team_stats/10", &record).await.unwrap();
        assert_eq!(store.get("team_stats/10").await.unwrap(), Some(record));
        assert_eq!(store.get("team_stats/1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn prefix_match_does_not_bleed_into_siblings() {
        let store = memory_store().await;
        store.set("h2h/m1", &json!({"draws": 1})).await.unwrap();
        store.set("h2h/m1_b", &json!({"draws": 2})).await.unwrap();
        store.delete("h2h/m1").await.unwrap();
        assert_eq!(store.get("h2h/m1_b").await.unwrap(), Some(json!({"draws": 2})));
    }

    #[tokio::test]
    async fn update_keeps_untouched_keys() {
        let store = memory_store().await;
        store.set("health/h2h", &json!({"status": "success", "pending_count": 2})).await.unwrap();
        let partial = json!({"pending_count": 0});
        store.update("health/h2h", partial.as_object().unwrap()).await.unwrap();
        assert_eq!(
            store.get("health/h2h").await.unwrap(),
            Some(json!({"status": "success", "pending_count": 0}))
        );
    }

    #[tokio::test]
    async fn push_appends_under_parent() {
        let store = memory_store().await;
        let key = store.push("alerts", &json!("degraded")).await.unwrap();
        assert_eq!(store.get(&format!("alerts/{key}")).await.unwrap(), Some(json!("degraded")));
    }
}
