//! Request dispatcher: one logical HTTP call with authentication, retry,
//! cached fallback and offline queuing.
//!
//! Flow of [`Dispatcher::request`]:
//! 1. Build `base_url + endpoint`; send JSON with `Authorization: Bearer`
//!    when a token is held.
//! 2. Non-2xx: a 401 drops the session; the status and body text become
//!    [`ClientError::Http`].
//! 3. 2xx: reset the `{method, endpoint}` retry counter and parse the body.
//! 4. Retryable failures back off (`base * 2^attempt`) and try again until
//!    the counter reaches the ceiling.
//! 5. On the native host, an offline failure that is out of retries is queued
//!    for replay. The error is returned either way.

use std::sync::Arc;

use fittrack_core::{
    ClientError, ClientResult, HttpMethod, OfflineAction, OfflineActionData, RequestOptions,
    TransportKind,
};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::ClientContext;
use crate::retry::{RetryCounters, RetryKey, RetryPolicy};

#[derive(Debug)]
pub struct Dispatcher {
    ctx: Arc<ClientContext>,
    http: reqwest::Client,
    policy: RetryPolicy,
    retries: RetryCounters,
}

impl Dispatcher {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        let policy = ctx.config().retry;
        Self {
            ctx,
            http: reqwest::Client::new(),
            policy,
            retries: RetryCounters::default(),
        }
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    /// Current retry count for `{method, endpoint}`.
    pub fn retry_count(&self, method: HttpMethod, endpoint: &str) -> u32 {
        self.retries.get(&RetryKey::new(method, endpoint))
    }

    /// Dispatch and decode the JSON body into `T`.
    pub async fn request<T>(&self, endpoint: &str, options: RequestOptions) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let value = self.request_value(endpoint, &options).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Dispatch and return the raw JSON body (`null` for an empty body).
    pub async fn request_value(&self, endpoint: &str, options: &RequestOptions) -> ClientResult<Value> {
        let key = RetryKey::new(options.method, endpoint);
        // Bounds this call even when a concurrent success resets the shared counter.
        let mut local_retries = 0u32;

        loop {
            let err = match self.send_once(endpoint, options).await {
                Ok(value) => {
                    self.retries.reset(&key);
                    return Ok(value);
                }
                Err(err) => err,
            };

            let attempt = self.retries.get(&key);
            if err.is_retryable()
                && attempt < self.policy.max_retries
                && local_retries < self.policy.max_retries
            {
                self.retries.increment(&key);
                local_retries += 1;
                let delay = self.policy.delay_for(attempt);
                tracing::warn!(
                    request = %key,
                    attempt = attempt + 1,
                    max_retries = self.policy.max_retries,
                    "retrying in {delay:?}: {err}"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if attempt > 0 {
                tracing::warn!(request = %key, "giving up after {attempt} retries: {err}");
            }
            self.retries.reset(&key);
            self.defer_if_offline(endpoint, options, &err).await;
            return Err(err);
        }
    }

    /// Dispatch a read whose failure is answered from the last good snapshot.
    ///
    /// Success refreshes the snapshot under `cache_key`. Failure returns the
    /// snapshot, or `default()` when there is none. Never errors.
    pub async fn request_with_fallback<T, F>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        cache_key: &str,
        default: F,
    ) -> T
    where
        T: DeserializeOwned + Serialize + Sync,
        F: FnOnce() -> T,
    {
        let store = self.ctx.store();
        match self.request::<T>(endpoint, options).await {
            Ok(value) => {
                if let Err(err) = fittrack_store::set_json(store, cache_key, &value).await {
                    tracing::warn!("failed to refresh snapshot {cache_key}: {err}");
                }
                value
            }
            Err(err) => {
                tracing::warn!("{endpoint} failed, serving cached snapshot: {err}");
                match fittrack_store::get_json::<T>(store, cache_key).await {
                    Ok(Some(cached)) => cached,
                    Ok(None) => default(),
                    Err(read_err) => {
                        tracing::warn!("unreadable snapshot {cache_key}: {read_err}");
                        default()
                    }
                }
            }
        }
    }

    async fn send_once(&self, endpoint: &str, options: &RequestOptions) -> ClientResult<Value> {
        let url = self.ctx.url_for(endpoint).await;
        let mut req = self
            .http
            .request(to_reqwest_method(options.method), &url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.ctx.token().await {
            req = req.bearer_auth(token);
        }
        if let Some(timeout) = self.ctx.config().request_timeout {
            req = req.timeout(timeout);
        }
        if let Some(body) = &options.body {
            req = req.body(serde_json::to_vec(body)?);
        }

        tracing::debug!(method = %options.method, %url, "dispatching request");
        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = ClientError::http(status.as_u16(), body);
            if err.is_unauthorized() {
                tracing::warn!("{endpoint} answered 401; clearing session");
                if let Err(clear_err) = self.ctx.clear_session().await {
                    tracing::error!("failed to clear persisted session: {clear_err}");
                }
            }
            return Err(err);
        }

        let bytes = resp.bytes().await.map_err(transport_error)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn defer_if_offline(&self, endpoint: &str, options: &RequestOptions, err: &ClientError) {
        if !options.queue_when_offline || !self.ctx.platform().is_native() || !err.is_offline() {
            return;
        }
        let Some(queue) = self.ctx.offline_queue() else {
            return;
        };

        let action = OfflineAction::for_request(endpoint, options.method);
        let data = OfflineActionData {
            endpoint: endpoint.to_string(),
            options: options.clone(),
        };
        if let Err(queue_err) = queue.enqueue_offline_action(action, data).await {
            tracing::error!("failed to queue offline action for {endpoint}: {queue_err}");
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Classify a reqwest failure.
pub(crate) fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_builder() {
        return ClientError::InvalidUrl(err.to_string());
    }

    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_body() || err.is_decode() {
        TransportKind::Body
    } else {
        TransportKind::Request
    };

    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ClientError::transport(kind, message)
}
