//! Application-root wiring of context, dispatcher, API and sync manager.

use std::sync::Arc;

use fittrack_core::ClientResult;
use fittrack_store::{KeyValueStore, OfflineQueue};

use crate::api::FitnessApi;
use crate::config::ClientConfig;
use crate::connection::ConnectionResolver;
use crate::context::ClientContext;
use crate::dispatcher::Dispatcher;
use crate::sync::SyncManager;

#[derive(Clone)]
pub struct FitTrackClient {
    context: Arc<ClientContext>,
    api: FitnessApi,
    sync: Arc<SyncManager>,
}

impl FitTrackClient {
    /// Startup: select storage for the platform, then settle on a reachable
    /// base URL (the configured default, else the first live fallback).
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        let context = ClientContext::for_platform(config).await?;
        let client = Self::from_context(context);

        let config = client.context.config();
        let resolver = ConnectionResolver::new(config.probe_timeout);
        let default = client.context.base_url().await;
        let chosen = resolver.establish(&default, &config.fallback_urls).await;
        if chosen != default {
            client.context.set_base_url(chosen).await;
        }

        Ok(client)
    }

    /// Build with injected storage and no startup probing.
    pub fn with_store(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        offline_queue: Option<Arc<dyn OfflineQueue>>,
    ) -> Self {
        Self::from_context(ClientContext::new(config, store, offline_queue))
    }

    fn from_context(context: ClientContext) -> Self {
        let context = Arc::new(context);
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&context)));
        let api = FitnessApi::new(dispatcher);
        let sync = Arc::new(SyncManager::new(api.clone()));
        Self { context, api, sync }
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        &self.context
    }

    pub fn api(&self) -> &FitnessApi {
        &self.api
    }

    pub fn sync(&self) -> &Arc<SyncManager> {
        &self.sync
    }
}
