//! Typed data access on top of the dispatcher.
//!
//! Every method logs and returns its error; only `get_workouts` and
//! `get_user_settings` answer failures from the cached snapshot.

use std::sync::Arc;

use chrono::NaiveDate;
use fittrack_core::{
    AuthResponse, ClientResult, MacroEntry, RegisterRequest, RequestOptions, User, UserSettings,
    Workout,
};
use fittrack_store::keys;
use serde_json::{Value, json};

use crate::dispatcher::Dispatcher;

pub const WORKOUTS: &str = "/workouts";
pub const USER_SETTINGS: &str = "/user/settings";
pub const MACROS: &str = "/macros";

#[derive(Debug, Clone)]
pub struct FitnessApi {
    dispatcher: Arc<Dispatcher>,
}

fn log_failure<T>(operation: &str, result: ClientResult<T>) -> ClientResult<T> {
    result.inspect_err(|err| tracing::error!("{operation} failed: {err}"))
}

impl FitnessApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    // -- auth ---------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let body = json!({ "email": email, "password": password });
        let result = self.authenticate("/auth/login", body).await;
        log_failure("login", result)
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        let result = match serde_json::to_value(request) {
            Ok(body) => self.authenticate("/auth/register", body).await,
            Err(err) => Err(err.into()),
        };
        log_failure("register", result)
    }

    async fn authenticate(&self, endpoint: &str, body: Value) -> ClientResult<AuthResponse> {
        let auth: AuthResponse = self
            .dispatcher
            .request(endpoint, RequestOptions::post(body))
            .await?;
        self.dispatcher
            .context()
            .set_session(&auth.token, &auth.user)
            .await?;
        tracing::info!(user = %auth.user.id, "signed in");
        Ok(auth)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.dispatcher.context().clear_session().await;
        if result.is_ok() {
            tracing::info!("signed out");
        }
        log_failure("logout", result)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.dispatcher.context().is_authenticated().await
    }

    /// The user stored by the last successful login or registration.
    pub async fn current_user(&self) -> ClientResult<Option<User>> {
        log_failure("current_user", self.dispatcher.context().current_user().await)
    }

    /// Reload a persisted token at startup.
    pub async fn restore_session(&self) -> ClientResult<bool> {
        log_failure(
            "restore_session",
            self.dispatcher.context().restore_session().await,
        )
    }

    // -- workouts -----------------------------------------------------------

    /// All workouts, or the last good list when the backend is unreachable.
    pub async fn get_workouts(&self) -> ClientResult<Vec<Workout>> {
        Ok(self
            .dispatcher
            .request_with_fallback(WORKOUTS, RequestOptions::get(), keys::CACHED_WORKOUTS, Vec::new)
            .await)
    }

    pub async fn get_workout(&self, id: &str) -> ClientResult<Workout> {
        let result = self
            .dispatcher
            .request(&format!("{WORKOUTS}/{id}"), RequestOptions::get())
            .await;
        log_failure("get_workout", result)
    }

    pub async fn save_workout(&self, workout: &Workout) -> ClientResult<Workout> {
        log_failure("save_workout", self.post_workout(workout, false).await)
    }

    /// Replay a queued `saveWorkout`; never re-queued.
    pub(crate) async fn replay_save_workout(&self, workout: &Workout) -> ClientResult<Workout> {
        log_failure("replay save_workout", self.post_workout(workout, true).await)
    }

    async fn post_workout(&self, workout: &Workout, replay: bool) -> ClientResult<Workout> {
        let mut options = RequestOptions::post(serde_json::to_value(workout)?);
        if replay {
            options = options.replay();
        }
        let saved: Workout = self.dispatcher.request(WORKOUTS, options).await?;
        self.refresh_workout_snapshot(&saved).await;
        Ok(saved)
    }

    /// Upsert `saved` into the cached workouts list.
    async fn refresh_workout_snapshot(&self, saved: &Workout) {
        let store = self.dispatcher.context().store();
        let mut cached: Vec<Workout> = fittrack_store::get_json(store, keys::CACHED_WORKOUTS)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();

        let existing = saved
            .id
            .as_ref()
            .and_then(|id| cached.iter().position(|w| w.id.as_ref() == Some(id)));
        match existing {
            Some(index) => cached[index] = saved.clone(),
            None => cached.push(saved.clone()),
        }

        if let Err(err) = fittrack_store::set_json(store, keys::CACHED_WORKOUTS, &cached).await {
            tracing::warn!("failed to refresh workouts snapshot: {err}");
        }
    }

    pub async fn delete_workout(&self, id: &str) -> ClientResult<()> {
        let result = self
            .dispatcher
            .request_value(&format!("{WORKOUTS}/{id}"), &RequestOptions::delete())
            .await
            .map(|_| ());
        log_failure("delete_workout", result)
    }

    // -- settings -----------------------------------------------------------

    /// Settings, or the last good copy (or defaults) when unreachable.
    pub async fn get_user_settings(&self) -> ClientResult<UserSettings> {
        Ok(self
            .dispatcher
            .request_with_fallback(
                USER_SETTINGS,
                RequestOptions::get(),
                keys::CACHED_SETTINGS,
                UserSettings::default,
            )
            .await)
    }

    pub async fn save_user_settings(&self, settings: &UserSettings) -> ClientResult<UserSettings> {
        log_failure("save_user_settings", self.put_settings(settings, false).await)
    }

    /// Replay a queued `saveUserSettings`; never re-queued.
    pub(crate) async fn replay_save_user_settings(
        &self,
        settings: &UserSettings,
    ) -> ClientResult<UserSettings> {
        log_failure("replay save_user_settings", self.put_settings(settings, true).await)
    }

    async fn put_settings(&self, settings: &UserSettings, replay: bool) -> ClientResult<UserSettings> {
        let mut options = RequestOptions::put(serde_json::to_value(settings)?);
        if replay {
            options = options.replay();
        }
        self.dispatcher.request(USER_SETTINGS, options).await
    }

    // -- nutrition ----------------------------------------------------------

    pub async fn get_macros(&self, date: NaiveDate) -> ClientResult<Vec<MacroEntry>> {
        let endpoint = format!("{MACROS}?date={}", date.format("%Y-%m-%d"));
        let result = self.dispatcher.request(&endpoint, RequestOptions::get()).await;
        log_failure("get_macros", result)
    }

    pub async fn log_macros(&self, entry: &MacroEntry) -> ClientResult<MacroEntry> {
        let result = match serde_json::to_value(entry) {
            Ok(body) => self.dispatcher.request(MACROS, RequestOptions::post(body)).await,
            Err(err) => Err(err.into()),
        };
        log_failure("log_macros", result)
    }

    // -- misc ---------------------------------------------------------------

    /// Liveness of the current base URL.
    pub async fn health(&self) -> ClientResult<Value> {
        let result = self
            .dispatcher
            .request_value("/health", &RequestOptions::get())
            .await;
        log_failure("health", result)
    }
}
