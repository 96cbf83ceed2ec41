//! Replay of offline writes when connectivity returns.
//!
//! The `SyncManager` consumes the unified connectivity signal:
//! - `Online`: mark connected and run a sync pass
//! - `Offline`: mark disconnected
//!
//! A sync pass drains the offline queue oldest-first and replays each entry
//! through the [`FitnessApi`]. Replay is best-effort and at-most-once: a
//! failing entry is logged and dropped, later entries still run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use fittrack_core::{ClientError, ClientResult, OfflineAction, OfflineQueueEntry, Platform};
use fittrack_store::OfflineQueue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::FitnessApi;
use crate::connection::ConnectionResolver;
use crate::connectivity::{self, ConnectivityEvents, ConnectivityHandle, ConnectivityPoller, ConnectivityState};

/// Outcome of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub replayed: usize,
    pub failed: usize,
    /// Entries whose action has no replay wired (`generic`).
    pub skipped: usize,
}

/// Tasks of a started manager. Dropping it closes the shutdown channel and
/// aborts the poller, so a manager dropped without `stop_sync` stops too.
struct Running {
    shutdown: watch::Sender<bool>,
    poller: Option<JoinHandle<()>>,
}

impl Drop for Running {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

pub struct SyncManager {
    api: FitnessApi,
    platform: Platform,
    queue: Option<Arc<dyn OfflineQueue>>,
    poller: ConnectivityPoller,
    online: AtomicBool,
    handle: ConnectivityHandle,
    events: Arc<tokio::sync::Mutex<ConnectivityEvents>>,
    running: Mutex<Option<Running>>,
}

impl SyncManager {
    /// Wire a manager to the API's context: its platform, its offline queue
    /// and its poll settings.
    pub fn new(api: FitnessApi) -> Self {
        let ctx = api.dispatcher().context().clone();
        let config = ctx.config();
        let poller = ConnectivityPoller::new(
            ConnectionResolver::new(config.probe_timeout),
            config.connectivity_probe_url.clone(),
            config.poll_interval,
        );
        let (handle, events) = connectivity::channel();

        Self {
            platform: ctx.platform(),
            queue: ctx.offline_queue().cloned(),
            api,
            poller,
            online: AtomicBool::new(true),
            handle,
            events: Arc::new(tokio::sync::Mutex::new(events)),
            running: Mutex::new(None),
        }
    }

    /// Publisher for host connectivity events (browser `online`/`offline`).
    pub fn connectivity(&self) -> ConnectivityHandle {
        self.handle.clone()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Start listening for connectivity changes; on the native host, also
    /// start the poller. No-op when already running.
    pub fn start_sync(self: &Arc<Self>) {
        let mut running = self.lock_running();
        if running.is_some() {
            tracing::debug!("sync already running");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        // The listener finishes an in-flight pass on shutdown; it is detached.
        self.spawn_listener(shutdown_rx.clone());
        let poller = self
            .platform
            .is_native()
            .then(|| self.poller.clone().spawn(self.handle.clone(), shutdown_rx));

        tracing::info!(platform = %self.platform, "sync started");
        *running = Some(Running { shutdown, poller });
    }

    /// Stop listening and polling. No-op when not running.
    pub fn stop_sync(&self) {
        let Some(running) = self.lock_running().take() else {
            tracing::debug!("sync not running");
            return;
        };

        drop(running);
        tracing::info!("sync stopped");
    }

    fn spawn_listener(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let manager = Arc::downgrade(self);
        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            let mut events = events.lock().await;
            loop {
                let state = tokio::select! {
                    // Also fires when the manager and its shutdown sender are gone.
                    _ = shutdown.changed() => break,
                    event = events.recv() => match event {
                        Some(state) => state,
                        None => break,
                    },
                };
                let Some(this) = manager.upgrade() else {
                    break;
                };
                this.on_connectivity(state).await;
            }
        });
    }

    async fn on_connectivity(&self, state: ConnectivityState) {
        match state {
            ConnectivityState::Online => {
                if !self.online.swap(true, Ordering::SeqCst) {
                    tracing::info!("connectivity restored");
                }
                self.sync_now().await;
            }
            ConnectivityState::Offline => {
                if self.online.swap(false, Ordering::SeqCst) {
                    tracing::warn!("connectivity lost");
                }
            }
        }
    }

    /// Run one sync pass now.
    pub async fn sync_now(&self) -> SyncReport {
        let mut report = SyncReport::default();
        let Some(queue) = &self.queue else {
            return report;
        };

        let entries = match queue.drain_offline_queue().await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!("failed to drain offline queue: {err}");
                return report;
            }
        };
        if entries.is_empty() {
            return report;
        }

        tracing::info!("replaying {} offline action(s)", entries.len());
        for entry in &entries {
            match self.replay(entry).await {
                Some(Ok(())) => report.replayed += 1,
                Some(Err(err)) => {
                    report.failed += 1;
                    tracing::warn!(id = %entry.id, action = %entry.action, "dropping offline action: {err}");
                }
                None => report.skipped += 1,
            }
        }

        tracing::info!(
            replayed = report.replayed,
            failed = report.failed,
            skipped = report.skipped,
            "sync pass complete"
        );
        report
    }

    /// Replay one entry; `None` when the action has no replay.
    async fn replay(&self, entry: &OfflineQueueEntry) -> Option<ClientResult<()>> {
        match entry.action {
            OfflineAction::SaveWorkout => Some(match decode_body(entry) {
                Ok(workout) => self.api.replay_save_workout(&workout).await.map(|_| ()),
                Err(err) => Err(err),
            }),
            OfflineAction::SaveUserSettings => Some(match decode_body(entry) {
                Ok(settings) => self.api.replay_save_user_settings(&settings).await.map(|_| ()),
                Err(err) => Err(err),
            }),
            OfflineAction::Generic => None,
        }
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode_body<T>(entry: &OfflineQueueEntry) -> ClientResult<T>
where
    T: DeserializeOwned,
{
    let body = entry
        .data
        .options
        .body
        .clone()
        .ok_or_else(|| ClientError::serialization(format!("{} has no body", entry.id)))?;
    Ok(serde_json::from_value(body)?)
}
