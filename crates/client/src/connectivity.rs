//! Connectivity signal shared by both platforms.
//!
//! Browser hosts push `online`/`offline` events through a
//! [`ConnectivityHandle`]; native hosts run a [`ConnectivityPoller`] that
//! publishes into the same channel. Consumers never know which source spoke.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::connection::ConnectionResolver;

/// Connectivity state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// The network is reachable.
    Online,
    /// The network is unreachable.
    Offline,
}

/// Receiving side of the signal.
pub type ConnectivityEvents = mpsc::UnboundedReceiver<ConnectivityState>;

/// Publishing side of the signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    tx: mpsc::UnboundedSender<ConnectivityState>,
}

pub fn channel() -> (ConnectivityHandle, ConnectivityEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ConnectivityHandle { tx }, rx)
}

impl ConnectivityHandle {
    pub fn report(&self, state: ConnectivityState) {
        if self.tx.send(state).is_err() {
            tracing::debug!("connectivity {state:?} reported with no listener");
        }
    }

    /// Host event: connectivity restored.
    pub fn report_online(&self) {
        self.report(ConnectivityState::Online);
    }

    /// Host event: connectivity lost.
    pub fn report_offline(&self) {
        self.report(ConnectivityState::Offline);
    }
}

/// Fixed-interval liveness probe for hosts without push connectivity events.
#[derive(Debug, Clone)]
pub struct ConnectivityPoller {
    resolver: ConnectionResolver,
    probe_url: String,
    interval: Duration,
}

impl ConnectivityPoller {
    pub fn new(resolver: ConnectionResolver, probe_url: impl Into<String>, interval: Duration) -> Self {
        Self {
            resolver,
            probe_url: probe_url.into(),
            interval,
        }
    }

    /// Probe immediately, then every `interval`, until `shutdown` flips.
    pub fn spawn(
        self,
        handle: ConnectivityHandle,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(url = %self.probe_url, interval = ?self.interval, "connectivity poller started");

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        let state = if self.resolver.check_url(&self.probe_url).await {
                            ConnectivityState::Online
                        } else {
                            ConnectivityState::Offline
                        };
                        handle.report(state);
                    }
                }
            }

            tracing::info!("connectivity poller stopped");
        })
    }
}
