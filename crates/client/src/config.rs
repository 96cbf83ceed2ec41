//! Client configuration.
//!
//! Built from the environment at startup; every field has a default so a bare
//! environment yields a development client for the detected platform.

use std::time::Duration;

use fittrack_core::Platform;

use crate::connection::{self, FALLBACK_BASE_URLS};
use crate::retry::RetryPolicy;

/// Deployment environment; selects the column of the base-URL table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Host row of the base-URL table: `web`, `android`, `ios` or `device`.
    pub host: String,
    pub platform: Platform,
    /// Skips the base-URL table when set.
    pub base_url: Option<String>,
    /// Tried in order when the default base URL fails its liveness probe.
    pub fallback_urls: Vec<String>,
    /// Well-known endpoint the native poller uses to detect connectivity.
    pub connectivity_probe_url: String,
    pub probe_timeout: Duration,
    pub poll_interval: Duration,
    /// Per-request timeout; `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            host: "web".to_string(),
            platform: Platform::detect(),
            base_url: None,
            fallback_urls: FALLBACK_BASE_URLS.iter().map(|s| s.to_string()).collect(),
            connectivity_probe_url: "https://clients3.google.com/generate_204".to_string(),
            probe_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(30),
            request_timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Read `FITTRACK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup("FITTRACK_ENV") {
            config.environment = match env.trim().to_ascii_lowercase().as_str() {
                "production" | "prod" => Environment::Production,
                "development" | "dev" => Environment::Development,
                other => {
                    tracing::warn!("unknown FITTRACK_ENV {other:?}; using development");
                    Environment::Development
                }
            };
        }

        if let Some(host) = lookup("FITTRACK_HOST") {
            config.host = host.trim().to_ascii_lowercase();
        }

        if let Some(platform) = lookup("FITTRACK_PLATFORM") {
            match Platform::parse(&platform) {
                Some(p) => config.platform = p,
                None => tracing::warn!(
                    "unknown FITTRACK_PLATFORM {platform:?}; using detected {}",
                    config.platform
                ),
            }
        }

        if let Some(url) = lookup("FITTRACK_BASE_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = Some(url.trim().trim_end_matches('/').to_string());
        }

        if let Some(url) = lookup("FITTRACK_PROBE_URL").filter(|u| !u.trim().is_empty()) {
            config.connectivity_probe_url = url.trim().to_string();
        }

        config
    }

    /// The base URL this configuration starts with.
    pub fn default_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => {
                connection::resolve_base_url(&self.host, self.environment.is_development())
                    .to_string()
            }
        }
    }
}
