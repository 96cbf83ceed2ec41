//! `fittrack-core`: shared building blocks for the fittrack client.
//!
//! This crate contains **pure** types (no I/O): platform detection, the client
//! error taxonomy, wire payloads and the offline queue entry model.

pub mod error;
pub mod id;
pub mod model;
pub mod offline;
pub mod platform;

pub use error::{ClientError, ClientResult, TransportKind};
pub use id::QueueEntryId;
pub use model::{
    AuthResponse, Exercise, HttpMethod, MacroEntry, RegisterRequest, RequestOptions, User,
    UserSettings, Workout,
};
pub use offline::{OfflineAction, OfflineActionData, OfflineQueueEntry};
pub use platform::Platform;
