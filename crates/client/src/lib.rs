//! `fittrack-client`
//!
//! **Responsibility:** the client's data-access core.
//!
//! This crate provides:
//! - Base-URL resolution and liveness probing ([`connection`])
//! - The request dispatcher: bearer auth, retry with backoff, cached
//!   fallback reads, offline queuing on the native host ([`dispatcher`])
//! - Typed endpoint methods ([`api`])
//! - Replay of queued writes when connectivity returns ([`sync`])
//!
//! All state lives in an explicitly constructed [`ClientContext`]; build one
//! per process through [`FitTrackClient`].

pub mod api;
pub mod client;
pub mod config;
pub mod connection;
pub mod connectivity;
pub mod context;
pub mod dispatcher;
pub mod retry;
pub mod sync;

pub use api::FitnessApi;
pub use client::FitTrackClient;
pub use config::{ClientConfig, Environment};
pub use connection::{ConnectionResolver, resolve_base_url};
pub use connectivity::{ConnectivityHandle, ConnectivityState};
pub use context::ClientContext;
pub use dispatcher::Dispatcher;
pub use retry::RetryPolicy;
pub use sync::{SyncManager, SyncReport};
