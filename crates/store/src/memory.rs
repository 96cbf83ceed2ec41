//! In-memory store used on the native host.
//!
//! Nothing here survives a process restart. The offline queue lives in the
//! same map, serialized under [`keys::OFFLINE_QUEUE`], and is rewritten on every
//! mutation so the map is always the single source of truth.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use fittrack_core::{OfflineAction, OfflineActionData, OfflineQueueEntry};
use tokio::sync::Mutex;

use crate::error::StoreResult;
use crate::keys;
use crate::store::{KeyValueStore, OfflineQueue};

/// In-memory key-value store with an offline queue.
///
/// Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with state handed over by the host.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(Mutex::new(map)),
        }
    }
}

/// Decode the persisted queue. Malformed content is discarded.
fn load_queue(map: &BTreeMap<String, String>) -> Vec<OfflineQueueEntry> {
    let Some(raw) = map.get(keys::OFFLINE_QUEUE) else {
        return Vec::new();
    };

    match serde_json::from_str(raw) {
        Ok(queue) => queue,
        Err(err) => {
            tracing::warn!("discarding unreadable offline queue: {err}");
            Vec::new()
        }
    }
}

fn save_queue(map: &mut BTreeMap<String, String>, queue: &[OfflineQueueEntry]) -> StoreResult<()> {
    let raw = serde_json::to_string(queue)?;
    map.insert(keys::OFFLINE_QUEUE.to_string(), raw);
    Ok(())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

#[async_trait]
impl OfflineQueue for MemoryStore {
    async fn enqueue_offline_action(
        &self,
        action: OfflineAction,
        data: OfflineActionData,
    ) -> StoreResult<OfflineQueueEntry> {
        let mut map = self.entries.lock().await;
        let mut queue = load_queue(&map);

        let entry = OfflineQueueEntry::new(action, data);
        queue.push(entry.clone());
        save_queue(&mut map, &queue)?;

        tracing::info!(
            id = %entry.id,
            action = %entry.action,
            endpoint = %entry.data.endpoint,
            queued = queue.len(),
            "queued offline action"
        );
        Ok(entry)
    }

    async fn offline_queue(&self) -> StoreResult<Vec<OfflineQueueEntry>> {
        Ok(load_queue(&*self.entries.lock().await))
    }

    async fn drain_offline_queue(&self) -> StoreResult<Vec<OfflineQueueEntry>> {
        let mut map = self.entries.lock().await;
        let queue = load_queue(&map);
        save_queue(&mut map, &[])?;
        Ok(queue)
    }

    async fn clear_offline_queue(&self) -> StoreResult<()> {
        let mut map = self.entries.lock().await;
        save_queue(&mut map, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fittrack_core::RequestOptions;
    use serde_json::json;

    fn workout_data(name: &str) -> OfflineActionData {
        OfflineActionData {
            endpoint: "/workouts".into(),
            options: RequestOptions::post(json!({ "name": name })),
        }
    }

    #[tokio::test]
    async fn basic_key_value_operations() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("b", "2").await.unwrap();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.list_keys().await.unwrap(), vec!["a", "b"]);

        store.remove("a").await.unwrap();
        store.remove("missing").await.unwrap();
        assert_eq!(store.list_keys().await.unwrap(), vec!["b"]);

        store.clear().await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", "v").await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn enqueue_persists_whole_queue_in_order() {
        let store = MemoryStore::new();
        store
            .enqueue_offline_action(OfflineAction::SaveWorkout, workout_data("first"))
            .await
            .unwrap();
        store
            .enqueue_offline_action(OfflineAction::SaveWorkout, workout_data("second"))
            .await
            .unwrap();

        let raw = store.get(keys::OFFLINE_QUEUE).await.unwrap().unwrap();
        let persisted: Vec<OfflineQueueEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].data.options.body, Some(json!({"name": "first"})));
        assert_eq!(persisted[1].data.options.body, Some(json!({"name": "second"})));
        assert_eq!(store.offline_queue().await.unwrap(), persisted);
    }

    #[tokio::test]
    async fn drain_takes_everything() {
        let store = MemoryStore::new();
        store
            .enqueue_offline_action(OfflineAction::Generic, workout_data("x"))
            .await
            .unwrap();

        let drained = store.drain_offline_queue().await.unwrap();
        assert_eq!(drained.len(), 1);
        assert!(store.offline_queue().await.unwrap().is_empty());
        assert!(store.drain_offline_queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_queue_is_treated_as_empty() {
        let store = MemoryStore::with_entries([(keys::OFFLINE_QUEUE, "{not json")]);
        assert!(store.offline_queue().await.unwrap().is_empty());

        store
            .enqueue_offline_action(OfflineAction::SaveWorkout, workout_data("after"))
            .await
            .unwrap();
        let queue = store.offline_queue().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].action, OfflineAction::SaveWorkout);
    }

    #[tokio::test]
    async fn clear_offline_queue_keeps_other_keys() {
        let store = MemoryStore::with_entries([(keys::AUTH_TOKEN, "t")]);
        store
            .enqueue_offline_action(OfflineAction::Generic, workout_data("x"))
            .await
            .unwrap();
        store.clear_offline_queue().await.unwrap();

        assert!(store.offline_queue().await.unwrap().is_empty());
        assert_eq!(store.get(keys::AUTH_TOKEN).await.unwrap().as_deref(), Some("t"));
    }
}
