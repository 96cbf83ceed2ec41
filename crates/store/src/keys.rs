//! Reserved keys of client state.

/// Session token of the signed-in user.
pub const AUTH_TOKEN: &str = "auth_token";

/// Serialized `User` from the last auth response.
pub const USER_DATA: &str = "user_data";

/// Serialized offline queue (native host).
pub const OFFLINE_QUEUE: &str = "offline_queue";

/// Last good `GET /workouts` payload.
pub const CACHED_WORKOUTS: &str = "cached_workouts";

/// Last good `GET /user/settings` payload.
pub const CACHED_SETTINGS: &str = "cached_settings";
