//! Identifiers for client-side records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::offline::OfflineAction;

/// Identifier of an offline queue entry.
///
/// Rendered as `{action}-{uuidv7}`: the action name plus a time-ordered UUID,
/// so ids sort by creation time within an action and stay unique when two
/// entries are created in the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueEntryId(String);

impl QueueEntryId {
    pub fn new(action: OfflineAction) -> Self {
        Self(format!("{}-{}", action.as_str(), Uuid::now_v7()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for QueueEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
