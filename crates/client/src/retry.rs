//! Retry policy and per-request retry counters.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use fittrack_core::HttpMethod;

/// Exponential backoff: attempt `n` (0-indexed) waits `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Every wait a fully failing request goes through, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).map(|n| self.delay_for(n)).collect()
    }
}

/// Counter key: one per `{method, endpoint}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetryKey {
    method: HttpMethod,
    endpoint: String,
}

impl RetryKey {
    pub fn new(method: HttpMethod, endpoint: &str) -> Self {
        Self {
            method,
            endpoint: endpoint.to_string(),
        }
    }
}

impl core::fmt::Display for RetryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.method, self.endpoint)
    }
}

/// Attempt counters shared by every in-flight request.
///
/// Concurrent calls with the same key share one counter, so one call's
/// success resets retries another call has accumulated.
#[derive(Debug, Default)]
pub struct RetryCounters {
    counts: Mutex<HashMap<RetryKey, u32>>,
}

impl RetryCounters {
    pub fn get(&self, key: &RetryKey) -> u32 {
        self.lock().get(key).copied().unwrap_or(0)
    }

    /// Increment and return the previous value.
    pub fn increment(&self, key: &RetryKey) -> u32 {
        let mut counts = self.lock();
        let slot = counts.entry(key.clone()).or_insert(0);
        let previous = *slot;
        *slot += 1;
        previous
    }

    pub fn reset(&self, key: &RetryKey) {
        self.lock().remove(key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RetryKey, u32>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
