//! Storage capabilities.

use async_trait::async_trait;
use fittrack_core::{OfflineAction, OfflineActionData, OfflineQueueEntry};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreResult;

/// String key-value persistence.
///
/// Values are opaque strings; structured values are stored as JSON through
/// [`get_json`] / [`set_json`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// All keys, sorted.
    async fn list_keys(&self) -> StoreResult<Vec<String>>;

    async fn clear(&self) -> StoreResult<()>;
}

/// Ordered queue of writes deferred while offline.
///
/// Implementations must serialize mutations: an enqueue racing a drain either
/// lands in the drained batch or stays queued for the next one, never lost.
#[async_trait]
pub trait OfflineQueue: Send + Sync {
    /// Append an entry and persist the whole queue.
    async fn enqueue_offline_action(
        &self,
        action: OfflineAction,
        data: OfflineActionData,
    ) -> StoreResult<OfflineQueueEntry>;

    /// Snapshot of the queue, oldest first.
    async fn offline_queue(&self) -> StoreResult<Vec<OfflineQueueEntry>>;

    /// Take every entry, oldest first, leaving the queue empty.
    async fn drain_offline_queue(&self) -> StoreResult<Vec<OfflineQueueEntry>>;

    async fn clear_offline_queue(&self) -> StoreResult<()>;
}

/// Read and decode a JSON value.
pub async fn get_json<T>(store: &dyn KeyValueStore, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub async fn set_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized + Sync,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}
