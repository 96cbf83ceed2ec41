//! Client context: the process-wide state every component borrows.
//!
//! Owned by the application root and passed by reference; there is no ambient
//! module state. Holds the session token, the current base URL and the storage
//! backends selected for the platform.

use std::sync::Arc;

use fittrack_core::{ClientResult, Platform, User};
use fittrack_store::{KeyValueStore, MemoryStore, OfflineQueue, SqliteStore, keys};
use tokio::sync::RwLock;

use crate::config::ClientConfig;

pub struct ClientContext {
    config: ClientConfig,
    base_url: RwLock<String>,
    token: RwLock<Option<String>>,
    store: Arc<dyn KeyValueStore>,
    offline_queue: Option<Arc<dyn OfflineQueue>>,
}

impl core::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientContext")
            .field("platform", &self.config.platform)
            .field("has_offline_queue", &self.offline_queue.is_some())
            .finish_non_exhaustive()
    }
}

impl ClientContext {
    /// Build with explicitly injected storage.
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        offline_queue: Option<Arc<dyn OfflineQueue>>,
    ) -> Self {
        let base_url = config.default_base_url();
        Self {
            config,
            base_url: RwLock::new(base_url),
            token: RwLock::new(None),
            store,
            offline_queue,
        }
    }

    /// Build with the storage the configured platform uses: a durable SQLite
    /// store on the web, an in-memory store with an offline queue natively.
    pub async fn for_platform(config: ClientConfig) -> ClientResult<Self> {
        match config.platform {
            Platform::Web => {
                let store = SqliteStore::open_default().await?;
                Ok(Self::new(config, Arc::new(store), None))
            }
            Platform::Native => {
                let store = MemoryStore::new();
                let queue: Arc<dyn OfflineQueue> = Arc::new(store.clone());
                Ok(Self::new(config, Arc::new(store), Some(queue)))
            }
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn platform(&self) -> Platform {
        self.config.platform
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn offline_queue(&self) -> Option<&Arc<dyn OfflineQueue>> {
        self.offline_queue.as_ref()
    }

    pub async fn base_url(&self) -> String {
        self.base_url.read().await.clone()
    }

    pub async fn set_base_url(&self, url: impl Into<String>) {
        let url = url.into();
        tracing::info!("using base url {url}");
        *self.base_url.write().await = url;
    }

    /// `base_url + endpoint`, with exactly one `/` between them.
    pub async fn url_for(&self, endpoint: &str) -> String {
        let base = self.base_url.read().await;
        let base = base.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{base}{endpoint}")
        } else {
            format!("{base}/{endpoint}")
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Persist `token` together with `user`, then hold the token.
    ///
    /// On a storage failure nothing is held and no partial session is left
    /// in the store.
    pub async fn set_session(&self, token: &str, user: &User) -> ClientResult<()> {
        if let Err(err) = self.persist_session(token, user).await {
            if let Err(cleanup) = self.store.remove(keys::AUTH_TOKEN).await {
                tracing::warn!("failed to remove partially stored session: {cleanup}");
            }
            return Err(err);
        }
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn persist_session(&self, token: &str, user: &User) -> ClientResult<()> {
        self.store.set(keys::AUTH_TOKEN, token).await?;
        fittrack_store::set_json(self.store.as_ref(), keys::USER_DATA, user).await?;
        Ok(())
    }

    /// Drop the held token and its persisted copy (and the stored user).
    pub async fn clear_session(&self) -> ClientResult<()> {
        *self.token.write().await = None;
        self.store.remove(keys::AUTH_TOKEN).await?;
        self.store.remove(keys::USER_DATA).await?;
        Ok(())
    }

    /// Load a persisted token into memory. Returns whether one was found.
    pub async fn restore_session(&self) -> ClientResult<bool> {
        let token = self.store.get(keys::AUTH_TOKEN).await?;
        let found = token.is_some();
        *self.token.write().await = token;
        Ok(found)
    }

    pub async fn current_user(&self) -> ClientResult<Option<User>> {
        Ok(fittrack_store::get_json(self.store.as_ref(), keys::USER_DATA).await?)
    }
}
