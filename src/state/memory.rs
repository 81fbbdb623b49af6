use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use super::path::join;
use super::tree::{ancestors, assemble, flatten, push_key, within};
use super::HierarchicalStore;
use crate::error::Result;

/// In-process store backend: leaf path → leaf value.
///
/// Multi-step writes are not atomic across concurrent writers; one job process
/// is the only writer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    leaves: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn remove_subtree(&self, path: &str) {
        self.leaves.retain(|key, _| !within(path, key));
    }

    fn write(&self, path: &str, value: &Value) {
        self.remove_subtree(path);
        for ancestor in ancestors(path) {
            self.leaves.remove(&ancestor);
        }
        for (leaf_path, leaf) in flatten(path, value) {
            self.leaves.insert(leaf_path, leaf);
        }
    }
}

#[async_trait]
impl HierarchicalStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let leaves: Vec<(String, Value)> = self
            .leaves
            .iter()
            .filter(|entry| within(path, entry.key()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        Ok(assemble(path, leaves))
    }

    async fn set(&self, path: &str, value: &Value) -> Result<()> {
        self.write(path, value);
        Ok(())
    }

    async fn update(&self, path: &str, partial: &Map<String, Value>) -> Result<()> {
        for (key, value) in partial {
            self.write(&join(path, key), value);
        }
        Ok(())
    }

    async fn push(&self, path: &str, value: &Value) -> Result<String> {
        let key = push_key();
        self.write(&join(path, &key), value);
        Ok(key)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.remove_subtree(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_subtree_and_parent() {
        let store = MemoryStore::new();
        store.set("h2h/m1", &json!({"total_matches": 3, "draws": 0})).await.unwrap();
        store.set("h2h/m2", &json!({"total_matches": 0})).await.unwrap();

        assert_eq!(
            store.get("h2h/m1").await.unwrap(),
            Some(json!({"total_matches": 3, "draws": 0}))
        );
        let all = store.get("h2h").await.unwrap().unwrap();
        assert_eq!(all.as_object().unwrap().len(), 2);
        assert_eq!(store.get("h2h/m3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_replaces_previous_subtree() {
        let store = MemoryStore::new();
        store.set("health/h2h", &json!({"status": "error", "error_message": "boom"})).await.unwrap();
        store.set("health/h2h", &json!({"status": "success"})).await.unwrap();
        assert_eq!(store.get("health/h2h").await.unwrap(), Some(json!({"status": "success"})));
    }

    #[tokio::test]
    async fn set_below_scalar_replaces_it() {
        let store = MemoryStore::new();
        store.set("a", &json!(1)).await.unwrap();
        store.set("a/b", &json!(2)).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"b": 2})));
    }

    #[tokio::test]
    async fn update_merges_keys() {
        let store = MemoryStore::new();
        store.set("health/h2h", &json!({"status": "success", "processed_count": 4})).await.unwrap();
        let partial = json!({"processed_count": 5, "last_started": "now"});
        store.update("health/h2h", partial.as_object().unwrap()).await.unwrap();
        assert_eq!(
            store.get("health/h2h").await.unwrap(),
            Some(json!({"status": "success", "processed_count": 5, "last_started": "now"}))
        );
    }

    #[tokio::test]
    async fn push_generates_distinct_keys() {
        let store = MemoryStore::new();
        let k1 = store.push("alerts", &json!({"text": "a"})).await.unwrap();
        let k2 = store.push("alerts", &json!({"text": "b"})).await.unwrap();
        assert_ne!(k1, k2);
        let alerts = store.get("alerts").await.unwrap().unwrap();
        assert_eq!(alerts[&k2], json!({"text": "b"}));
    }

    #[tokio::test]
    async fn delete_removes_subtree_only() {
        let store = MemoryStore::new();
        store.set("team_stats/1", &json!({"id": 1})).await.unwrap();
        store.set("team_stats/10", &json!({"id": 10})).await.unwrap();
        store.delete("team_stats/1").await.unwrap();
        assert_eq!(store.get("team_stats/1").await.unwrap(), None);
        assert_eq!(store.get("team_stats/10").await.unwrap(), Some(json!({"id": 10})));
    }
}
