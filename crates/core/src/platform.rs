//! Runtime platform detection.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// The host the client runs on.
///
/// Selects the storage backend, the connectivity strategy and the row of the
/// base-URL table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser host: durable storage, push connectivity events, no offline queue.
    Web,
    /// Native host: in-memory storage with offline queue, polled connectivity.
    Native,
}

static DETECTED: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// Detect the platform of the current build, once.
    pub fn detect() -> Self {
        *DETECTED.get_or_init(|| {
            if cfg!(target_arch = "wasm32") {
                Platform::Web
            } else {
                Platform::Native
            }
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Native => "native",
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Platform::Native)
    }

    /// Parse a platform name; unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "browser" => Some(Platform::Web),
            "native" | "mobile" => Some(Platform::Native),
            _ => None,
        }
    }
}

impl core::fmt::Display for Platform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
