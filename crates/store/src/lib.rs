//! `fittrack-store`
//!
//! **Responsibility:** client-side key-value persistence.
//!
//! This crate provides:
//! - The [`KeyValueStore`] capability every platform implements
//! - [`SqliteStore`], the durable variant used by the web profile
//! - [`MemoryStore`], the native variant, which also carries the
//!   [`OfflineQueue`] of deferred writes

pub mod error;
pub mod keys;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{KeyValueStore, OfflineQueue, get_json, set_json};
