#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use fittrack_client::{ClientConfig, FitTrackClient, RetryPolicy};
use fittrack_core::Platform;
use fittrack_store::{MemoryStore, OfflineQueue};
use serde_json::{Value, json};

pub const TOKEN: &str = "token-123";

/// Recorded requests and canned data of the mock backend.
#[derive(Default)]
pub struct MockState {
    hits: Mutex<HashMap<String, usize>>,
    auth_headers: Mutex<Vec<Option<String>>>,
    workouts: Mutex<Vec<Value>>,
    settings: Mutex<Value>,
}

impl MockState {
    fn hit(&self, route: &str) -> usize {
        let mut hits = self.hits.lock().unwrap();
        let count = hits.entry(route.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let ok = auth.as_deref() == Some(&format!("Bearer {TOKEN}"));
        self.auth_headers.lock().unwrap().push(auth);
        ok
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api/health", get(health))
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/workouts", get(list_workouts).post(save_workout))
            .route("/api/workouts/:id", delete(delete_workout).get(get_workout))
            .route("/api/user/settings", get(get_settings).put(put_settings))
            .route("/api/macros", get(list_macros).post(log_macro))
            .route("/api/flaky", get(flaky))
            .route("/api/recovering", get(recovering))
            .route("/api/broken", get(broken))
            .route("/api/empty", get(empty))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            handle,
        }
    }

    pub fn hits(&self, route: &str) -> usize {
        self.state.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.state.auth_headers.lock().unwrap().clone()
    }

    pub fn saved_workouts(&self) -> Vec<Value> {
        self.state.workouts.lock().unwrap().clone()
    }

    pub fn seed_workouts(&self, workouts: Vec<Value>) {
        *self.state.workouts.lock().unwrap() = workouts;
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn health(State(state): State<Arc<MockState>>) -> Response {
    state.hit("health");
    Json(json!({"status": "ok"})).into_response()
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.hit("login");
    if body["password"] == "secret" {
        Json(json!({
            "token": TOKEN,
            "user": {"id": "u1", "email": body["email"], "name": "Ada"}
        }))
        .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "invalid credentials").into_response()
    }
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.hit("register");
    Json(json!({
        "token": TOKEN,
        "user": {"id": "u2", "email": body["email"], "name": body["name"]}
    }))
    .into_response()
}

async fn list_workouts(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("list_workouts");
    if !state.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing or invalid token").into_response();
    }
    Json(Value::Array(state.workouts.lock().unwrap().clone())).into_response()
}

async fn save_workout(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.hit("save_workout");
    state.authorized(&headers);
    if body["name"] == "poison" {
        return (StatusCode::UNPROCESSABLE_ENTITY, "cannot save workout").into_response();
    }
    let mut workouts = state.workouts.lock().unwrap();
    if body.get("id").is_none() {
        body["id"] = json!(format!("w{}", workouts.len() + 1));
    }
    workouts.push(body.clone());
    Json(body).into_response()
}

async fn get_workout(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    state.hit("get_workout");
    let workouts = state.workouts.lock().unwrap();
    match workouts.iter().find(|w| w["id"] == id.as_str()) {
        Some(w) => Json(w.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("no workout {id}")).into_response(),
    }
}

async fn delete_workout(State(state): State<Arc<MockState>>, Path(id): Path<String>) -> Response {
    state.hit("delete_workout");
    state.workouts.lock().unwrap().retain(|w| w["id"] != id.as_str());
    StatusCode::NO_CONTENT.into_response()
}

async fn get_settings(State(state): State<Arc<MockState>>) -> Response {
    state.hit("get_settings");
    let settings = state.settings.lock().unwrap().clone();
    if settings.is_null() {
        Json(json!({})).into_response()
    } else {
        Json(settings).into_response()
    }
}

async fn put_settings(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.hit("put_settings");
    *state.settings.lock().unwrap() = body.clone();
    Json(body).into_response()
}

async fn list_macros(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit("list_macros");
    let date = query.get("date").cloned().unwrap_or_default();
    Json(json!([{
        "id": "m1",
        "date": date,
        "meal": "breakfast",
        "calories": 450,
        "proteinG": 30.0,
        "carbsG": 50.0,
        "fatG": 12.0
    }]))
    .into_response()
}

async fn log_macro(State(state): State<Arc<MockState>>, Json(mut body): Json<Value>) -> Response {
    state.hit("log_macro");
    body["id"] = json!("m2");
    Json(body).into_response()
}

/// Always fails like a gateway that timed out upstream.
async fn flaky(State(state): State<Arc<MockState>>) -> Response {
    state.hit("flaky");
    (StatusCode::SERVICE_UNAVAILABLE, "upstream timeout").into_response()
}

/// Fails twice, then succeeds.
async fn recovering(State(state): State<Arc<MockState>>) -> Response {
    if state.hit("recovering") <= 2 {
        (StatusCode::GATEWAY_TIMEOUT, "gateway timeout").into_response()
    } else {
        Json(json!({"recovered": true})).into_response()
    }
}

async fn broken(State(state): State<Arc<MockState>>) -> Response {
    state.hit("broken");
    (StatusCode::INTERNAL_SERVER_ERROR, "database exploded").into_response()
}

async fn empty(State(state): State<Arc<MockState>>) -> Response {
    state.hit("empty");
    StatusCode::NO_CONTENT.into_response()
}

/// A base URL nothing listens on: connections are refused.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

pub fn test_config(base_url: &str, platform: Platform) -> ClientConfig {
    ClientConfig {
        platform,
        base_url: Some(base_url.to_string()),
        fallback_urls: Vec::new(),
        probe_timeout: Duration::from_millis(500),
        retry: RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        },
        ..ClientConfig::default()
    }
}

/// Native client over an in-memory store that doubles as the offline queue.
pub fn native_client(base_url: &str) -> (FitTrackClient, MemoryStore) {
    native_client_with(test_config(base_url, Platform::Native))
}

pub fn native_client_with(config: ClientConfig) -> (FitTrackClient, MemoryStore) {
    let store = MemoryStore::new();
    let queue: Arc<dyn OfflineQueue> = Arc::new(store.clone());
    let client = FitTrackClient::with_store(config, Arc::new(store.clone()), Some(queue));
    (client, store)
}

/// Web-profile client: no offline queue.
pub fn web_client(base_url: &str) -> (FitTrackClient, MemoryStore) {
    let store = MemoryStore::new();
    let client = FitTrackClient::with_store(
        test_config(base_url, Platform::Web),
        Arc::new(store.clone()),
        None,
    );
    (client, store)
}
