//! # In-Memory Document Store
//!
//! A process-local [`DocumentStore`] used by the default binary wiring and by
//! tests. Collections are created on first write.
//!
//! ## Notes
//! - Each call takes the lock once, so single calls are atomic but sequences
//!   of calls are not, the same guarantee a remote store gives.
//! - Generated keys are a zero-padded sequence number prefixed with `-` so they
//!   sort in insertion order, like push keys of hosted document stores.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::store::{DocumentStore, Entry, StoreResult};

type Collection = BTreeMap<String, Value>;

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    next_key: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Returns true if `collection` holds no records.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn generate_key(&self) -> String {
        let seq = self.next_key.fetch_add(1, Ordering::Relaxed);
        format!("-{seq:016}")
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> StoreResult<Vec<Entry>> {
        let collections = self.collections.read();
        let entries = collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, record)| Entry {
                        id: id.clone(),
                        record: record.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(entries)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, record: Value) -> StoreResult<()> {
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record);
        Ok(())
    }

    async fn append(&self, collection: &str, record: Value) -> StoreResult<String> {
        let key = self.generate_key();
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.clone(), record);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_then_get_replaces_in_place() {
        let store = MemoryStore::new();
        store.put("users", "u1", json!({"name": "a"})).await.unwrap();
        store.put("users", "u1", json!({"name": "b"})).await.unwrap();

        assert_eq!(store.len("users"), 1);
        let record = store.get("users", "u1").await.unwrap();
        assert_eq!(record, Some(json!({"name": "b"})));
    }

    #[tokio::test]
    async fn missing_collection_lists_empty() {
        let store = MemoryStore::new();
        assert!(store.list("nothing").await.unwrap().is_empty());
        assert_eq!(store.get("nothing", "x").await.unwrap(), None);
        assert!(store.is_empty("nothing"));
    }

    #[tokio::test]
    async fn appended_keys_sort_in_insertion_order() {
        let store = MemoryStore::new();
        let mut keys = Vec::new();
        for i in 0..12 {
            keys.push(store.append("notifications", json!({"n": i})).await.unwrap());
        }

        let listed: Vec<String> = store
            .list("notifications")
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(listed, keys);
    }
}
