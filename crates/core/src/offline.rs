//! Offline queue entry model (native host only).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::QueueEntryId;
use crate::model::{HttpMethod, RequestOptions};

/// Symbolic name of a deferred write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OfflineAction {
    SaveWorkout,
    SaveUserSettings,
    /// Anything else. Queued, but not replayed.
    Generic,
}

impl OfflineAction {
    /// Derive the action from the request that failed.
    ///
    /// Query strings are ignored. Settings may live at `/settings` or
    /// `/user/settings`; both map to `saveUserSettings`.
    pub fn for_request(endpoint: &str, method: HttpMethod) -> Self {
        let path = endpoint.split(['?', '#']).next().unwrap_or(endpoint);
        let path = path.trim_end_matches('/');
        match method {
            HttpMethod::Post if path == "/workouts" => OfflineAction::SaveWorkout,
            HttpMethod::Put if path.ends_with("/settings") => OfflineAction::SaveUserSettings,
            _ => OfflineAction::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OfflineAction::SaveWorkout => "saveWorkout",
            OfflineAction::SaveUserSettings => "saveUserSettings",
            OfflineAction::Generic => "generic",
        }
    }
}

impl core::fmt::Display for OfflineAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The original call captured for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineActionData {
    pub endpoint: String,
    pub options: RequestOptions,
}

/// A write deferred while the native host was offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineQueueEntry {
    pub id: QueueEntryId,
    pub action: OfflineAction,
    pub data: OfflineActionData,
    pub timestamp: DateTime<Utc>,
}

impl OfflineQueueEntry {
    pub fn new(action: OfflineAction, data: OfflineActionData) -> Self {
        Self {
            id: QueueEntryId::new(action),
            action,
            data,
            timestamp: Utc::now(),
        }
    }
}
