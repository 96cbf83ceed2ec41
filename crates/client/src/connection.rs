//! Base-URL resolution and liveness probing.

use std::time::Duration;

/// Candidates tried, in order, when the default base URL is unreachable.
pub const FALLBACK_BASE_URLS: &[&str] = &[
    "http://localhost:3000/api",
    "http://127.0.0.1:3000/api",
    "http://10.0.2.2:3000/api",
    "http://192.168.1.100:3000/api",
];

const PRODUCTION_BASE_URL: &str = "https://api.fittrack.app/api";

/// Rows of the base-URL table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostKind {
    Web,
    Android,
    Ios,
    PhysicalDevice,
}

impl HostKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Some(HostKind::Web),
            "android" => Some(HostKind::Android),
            "ios" => Some(HostKind::Ios),
            "device" | "physical" | "physical-device" => Some(HostKind::PhysicalDevice),
            _ => None,
        }
    }

    fn base_url(self, is_development: bool) -> &'static str {
        if !is_development {
            return PRODUCTION_BASE_URL;
        }
        match self {
            HostKind::Web | HostKind::Ios => "http://localhost:3000/api",
            // The Android emulator reaches the host loopback through 10.0.2.2.
            HostKind::Android => "http://10.0.2.2:3000/api",
            HostKind::PhysicalDevice => "http://192.168.1.100:3000/api",
        }
    }
}

/// Look up the base URL for `host`. Unknown hosts get the web/development entry.
pub fn resolve_base_url(host: &str, is_development: bool) -> &'static str {
    match HostKind::parse(host) {
        Some(kind) => kind.base_url(is_development),
        None => {
            tracing::debug!("unknown host {host:?}; using web development base url");
            HostKind::Web.base_url(true)
        }
    }
}

/// Liveness prober for candidate base URLs.
#[derive(Debug, Clone)]
pub struct ConnectionResolver {
    http: reqwest::Client,
    timeout: Duration,
}

impl ConnectionResolver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    /// `GET {base_url}/health`; true iff it answers 2xx within the timeout.
    pub async fn probe(&self, base_url: &str) -> bool {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        self.check_url(&url).await
    }

    /// `GET url`; true iff it answers 2xx within the timeout. Never errors.
    pub async fn check_url(&self, url: &str) -> bool {
        match self.http.get(url).timeout(self.timeout).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                tracing::debug!(url, status = %resp.status(), ok, "liveness probe");
                ok
            }
            Err(err) => {
                tracing::debug!(url, "liveness probe failed: {err}");
                false
            }
        }
    }

    /// First candidate whose probe succeeds, tried sequentially.
    pub async fn find_working_connection<S>(&self, candidates: &[S]) -> Option<String>
    where
        S: AsRef<str>,
    {
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if self.probe(candidate).await {
                tracing::info!("found working connection: {candidate}");
                return Some(candidate.to_string());
            }
        }
        None
    }

    /// Startup: keep `default` if it is alive, else adopt the first working
    /// candidate, else keep `default` anyway.
    pub async fn establish<S>(&self, default: &str, candidates: &[S]) -> String
    where
        S: AsRef<str>,
    {
        if self.probe(default).await {
            return default.to_string();
        }

        tracing::warn!("default base url {default} is unreachable; trying fallbacks");
        match self.find_working_connection(candidates).await {
            Some(url) => url,
            None => {
                tracing::warn!("no fallback base url responded; keeping {default}");
                default.to_string()
            }
        }
    }
}
