use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::StreamExt;
use serde_json::{Map, Value};
use tokio::sync::{watch, Mutex};

use crate::core::error::{AppError, Result};

use super::{RealtimeStore, SnapshotStream, TransactionFn};

/// In-process implementation of [`RealtimeStore`].
///
/// Backs tests and local development with the same contract as the remote
/// store: a JSON tree behind a mutex, with a revision counter that wakes
/// subscribers on every write. Follows the store's write semantics,
/// including `null` fields deleting keys on partial updates.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    tree: Mutex<Value>,
    revision: watch::Sender<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_tree(Value::Null)
    }

    pub fn with_tree(tree: Value) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(MemoryInner {
                tree: Mutex::new(tree),
                revision,
            }),
        }
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Clone of the subtree at `path`, `Null` when absent.
fn subtree(root: &Value, path: &str) -> Value {
    let mut node = root;
    for segment in segments(path) {
        match node.get(segment) {
            Some(child) => node = child,
            None => return Value::Null,
        }
    }
    node.clone()
}

/// Mutable handle on the subtree at `path`, materializing objects along
/// the way.
fn subtree_mut<'a>(mut node: &'a mut Value, path: &str) -> &'a mut Value {
    for segment in segments(path) {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map.entry(segment).or_insert(Value::Null),
            _ => unreachable!(),
        };
    }
    node
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Value> {
        let tree = self.inner.tree.lock().await;
        Ok(subtree(&tree, path))
    }

    async fn update(&self, path: &str, fields: Value) -> Result<()> {
        let fields = match fields {
            Value::Object(fields) => fields,
            other => {
                return Err(AppError::Store(format!(
                    "partial update of {} requires an object, got {}",
                    path, other
                )))
            }
        };
        let mut tree = self.inner.tree.lock().await;
        let node = subtree_mut(&mut tree, path);
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            for (key, value) in fields {
                if value.is_null() {
                    map.remove(&key);
                } else {
                    map.insert(key, value);
                }
            }
        }
        drop(tree);
        self.bump();
        Ok(())
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        let mut tree = self.inner.tree.lock().await;
        *subtree_mut(&mut tree, path) = value;
        drop(tree);
        self.bump();
        Ok(())
    }

    async fn transaction(&self, path: &str, apply: TransactionFn) -> Result<Value> {
        let mut tree = self.inner.tree.lock().await;
        let current = subtree(&tree, path);
        let next = apply(current);
        *subtree_mut(&mut tree, path) = next.clone();
        drop(tree);
        self.bump();
        Ok(next)
    }

    async fn subscribe(&self, path: &str) -> Result<SnapshotStream> {
        let state = SubscribeState {
            store: self.clone(),
            path: path.to_string(),
            rx: self.inner.revision.subscribe(),
            first: true,
        };
        let stream = futures::stream::unfold(state, |mut state| async move {
            if state.first {
                state.first = false;
            } else {
                // Ends the stream once the store is gone. Bursts of writes
                // coalesce into a single wakeup.
                state.rx.changed().await.ok()?;
            }
            let tree = state.store.inner.tree.lock().await;
            let snapshot = subtree(&tree, &state.path);
            drop(tree);
            Some((snapshot, state))
        });
        Ok(stream.boxed())
    }
}

struct SubscribeState {
    store: MemoryStore,
    path: String,
    rx: watch::Receiver<u64>,
    first: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_absent_path_reads_as_null() {
        let store = MemoryStore::new();
        let value = store.get("reports/missing").await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips_nested_paths() {
        let store = MemoryStore::new();
        store.set("users/u1/name", json!("Ana")).await.unwrap();
        assert_eq!(store.get("users/u1/name").await.unwrap(), json!("Ana"));
        assert_eq!(store.get("users/u1").await.unwrap(), json!({"name": "Ana"}));
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_null_deletes() {
        let store = MemoryStore::with_tree(json!({
            "reports": {"r1": {"status": "pending", "publicized": true}}
        }));
        store
            .update("reports/r1", json!({"status": "Respond", "publicized": null}))
            .await
            .unwrap();
        assert_eq!(
            store.get("reports/r1").await.unwrap(),
            json!({"status": "Respond"})
        );
    }

    #[tokio::test]
    async fn test_update_rejects_non_object_payload() {
        let store = MemoryStore::new();
        let err = store.update("reports/r1", json!(42)).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }

    #[tokio::test]
    async fn test_concurrent_transactions_do_not_lose_increments() {
        let store = MemoryStore::with_tree(json!({"users": {"u1": {"warnCount": 0}}}));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .transaction(
                        "users/u1/warnCount",
                        Box::new(|current| json!(current.as_i64().unwrap_or(0) + 1)),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.get("users/u1/warnCount").await.unwrap(), json!(10));
    }

    #[tokio::test]
    async fn test_subscribe_yields_current_snapshot_then_changes() {
        let store = MemoryStore::with_tree(json!({"reports": {"r1": {"status": "pending"}}}));
        let mut stream = store.subscribe("reports").await.unwrap();

        let first = stream.next().await.unwrap();
        assert_eq!(first, json!({"r1": {"status": "pending"}}));

        store
            .update("reports/r1", json!({"status": "Respond"}))
            .await
            .unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(second, json!({"r1": {"status": "Respond"}}));
    }
}
