//! Shared test helpers
//!
//! `FakeProvider` is an in-process axum server standing in for every
//! external service (token endpoint, device listing, search, playback,
//! recognition). Each route counts its requests and replies with whatever
//! the test configured, so tests can assert both behavior and the exact
//! number of network calls made.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use clap::Parser;
use tempfile::TempDir;
use waxeye::spotify::Endpoints;
use waxeye::{AppState, Config};

/// A canned reply for one fake route
#[derive(Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay_ms: u64,
}

impl Reply {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: value.to_string(),
            delay_ms: 0,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    async fn send(self) -> Response {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        (
            StatusCode::from_u16(self.status).unwrap(),
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}

#[derive(Default)]
pub struct Recorded {
    pub token_form: Option<HashMap<String, String>>,
    pub token_auth: Option<String>,
    pub search_query: Option<HashMap<String, String>>,
    pub play_query: Option<HashMap<String, String>>,
    pub play_body: Option<serde_json::Value>,
}

pub struct ProviderState {
    pub token_requests: AtomicUsize,
    pub device_requests: AtomicUsize,
    pub search_requests: AtomicUsize,
    pub play_requests: AtomicUsize,
    pub annotate_requests: AtomicUsize,

    pub token_reply: Mutex<Reply>,
    pub devices_reply: Mutex<Reply>,
    pub search_reply: Mutex<Reply>,
    pub play_reply: Mutex<Reply>,
    pub annotate_reply: Mutex<Reply>,

    pub recorded: Mutex<Recorded>,
}

impl ProviderState {
    fn new() -> Self {
        Self {
            token_requests: AtomicUsize::new(0),
            device_requests: AtomicUsize::new(0),
            search_requests: AtomicUsize::new(0),
            play_requests: AtomicUsize::new(0),
            annotate_requests: AtomicUsize::new(0),
            token_reply: Mutex::new(Reply::json(serde_json::json!({
                "access_token": "fresh-token",
                "expires_in": 3600,
            }))),
            devices_reply: Mutex::new(Reply::json(serde_json::json!({
                "devices": [
                    {"id": "dev-1", "name": "Kitchen", "type": "Speaker", "is_restricted": false},
                    {"id": "dev-2", "name": "Cast Group", "type": "CastAudio", "is_restricted": true},
                ]
            }))),
            search_reply: Mutex::new(Reply::json(serde_json::json!({
                "albums": {"items": [{"uri": "spotify:album:default"}]},
                "tracks": {"items": []},
            }))),
            play_reply: Mutex::new(Reply::status(204, "")),
            annotate_reply: Mutex::new(Reply::json(serde_json::json!({
                "responses": [{"webDetection": {"bestGuessLabels": [{"label": "test label"}]}}]
            }))),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    pub fn total_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
            + self.device_requests.load(Ordering::SeqCst)
            + self.search_requests.load(Ordering::SeqCst)
            + self.play_requests.load(Ordering::SeqCst)
            + self.annotate_requests.load(Ordering::SeqCst)
    }

    pub fn set_token_reply(&self, reply: Reply) {
        *self.token_reply.lock().unwrap() = reply;
    }

    pub fn set_devices_reply(&self, reply: Reply) {
        *self.devices_reply.lock().unwrap() = reply;
    }

    pub fn set_search_reply(&self, reply: Reply) {
        *self.search_reply.lock().unwrap() = reply;
    }

    pub fn set_play_reply(&self, reply: Reply) {
        *self.play_reply.lock().unwrap() = reply;
    }

    pub fn set_annotate_reply(&self, reply: Reply) {
        *self.annotate_reply.lock().unwrap() = reply;
    }
}

pub struct FakeProvider {
    pub base_url: String,
    pub state: Arc<ProviderState>,
}

impl FakeProvider {
    pub async fn spawn() -> Self {
        let state = Arc::new(ProviderState::new());

        let app = Router::new()
            .route("/api/token", post(token_handler))
            .route("/v1/me/player/devices", get(devices_handler))
            .route("/v1/search", get(search_handler))
            .route("/v1/me/player/play", put(play_handler))
            .route("/annotate", post(annotate_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

async fn token_handler(
    State(state): State<Arc<ProviderState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.token_form = Some(form);
        recorded.token_auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
    }
    let reply = state.token_reply.lock().unwrap().clone();
    reply.send().await
}

async fn devices_handler(State(state): State<Arc<ProviderState>>) -> Response {
    state.device_requests.fetch_add(1, Ordering::SeqCst);
    let reply = state.devices_reply.lock().unwrap().clone();
    reply.send().await
}

async fn search_handler(
    State(state): State<Arc<ProviderState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.search_requests.fetch_add(1, Ordering::SeqCst);
    state.recorded.lock().unwrap().search_query = Some(query);
    let reply = state.search_reply.lock().unwrap().clone();
    reply.send().await
}

async fn play_handler(
    State(state): State<Arc<ProviderState>>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.play_requests.fetch_add(1, Ordering::SeqCst);
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.play_query = Some(query);
        recorded.play_body = Some(body);
    }
    let reply = state.play_reply.lock().unwrap().clone();
    reply.send().await
}

async fn annotate_handler(State(state): State<Arc<ProviderState>>) -> Response {
    state.annotate_requests.fetch_add(1, Ordering::SeqCst);
    let reply = state.annotate_reply.lock().unwrap().clone();
    reply.send().await
}

/// Options for building a test application
#[derive(Default)]
pub struct TestOptions {
    pub hide_restricted: bool,
    pub camera_command: Option<String>,
    pub still_image: Option<PathBuf>,
}

/// A fully wired application pointed at a fake provider
pub struct TestApp {
    pub state: AppState,
    pub provider: FakeProvider,
    // Keeps the settings file alive for the test's duration
    _store_dir: TempDir,
}

pub async fn test_app() -> TestApp {
    test_app_with(TestOptions::default()).await
}

pub async fn test_app_with(options: TestOptions) -> TestApp {
    let provider = FakeProvider::spawn().await;
    let store_dir = tempfile::tempdir().unwrap();
    let store_path = store_dir.path().join("settings.json");

    let mut args: Vec<String> = vec![
        "waxeye".into(),
        "--spotify-client-id".into(),
        "client-id".into(),
        "--spotify-client-secret".into(),
        "client-secret".into(),
        "--store-path".into(),
        store_path.to_str().unwrap().into(),
        "--http-timeout-secs".into(),
        "5".into(),
    ];
    if options.hide_restricted {
        args.push("--hide-restricted-devices".into());
    }
    if let Some(command) = &options.camera_command {
        args.push("--camera-command".into());
        args.push(command.clone());
    }
    if let Some(path) = &options.still_image {
        args.push("--still-image".into());
        args.push(path.to_str().unwrap().into());
    }

    let config = Config::try_parse_from(args).unwrap();
    let endpoints = Endpoints::with_base(&provider.base_url);
    let annotate_url = format!("{}/annotate", provider.base_url);
    let state = AppState::build(&config, endpoints, annotate_url).unwrap();

    TestApp {
        state,
        provider,
        _store_dir: store_dir,
    }
}

/// Store a valid session that expires an hour from now
pub fn store_fresh_session(app: &TestApp) {
    app.state
        .session
        .store_tokens("stored-token", "stored-refresh", 3600)
        .unwrap();
}

/// Store a session whose access token expired a minute ago
pub fn store_expired_session(app: &TestApp) {
    app.state
        .session
        .store_tokens("stale-token", "stored-refresh", -60)
        .unwrap();
}
