//! # Waxeye
//!
//! Point a camera at a record sleeve and the record starts playing on a
//! Spotify device. The interesting part is not the camera, it's the
//! state: an OAuth2 session with single-flight token refresh, a persisted
//! device selection, and a capture→recognize→search→play pipeline that
//! fails safely and never doubles up its side effects.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use waxeye_common::{Error, Result, SettingsStore};

pub mod api;
pub mod camera;
pub mod config;
pub mod pipeline;
pub mod spotify;
pub mod vision;

pub use config::Config;

use camera::Camera;
use pipeline::Pipeline;
use spotify::{
    AuthFlow, CatalogClient, ClientCredentials, DeviceRegistry, Endpoints, PlaybackController,
    SessionManager, TokenEndpoint,
};
use vision::Recognizer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SettingsStore>,
    pub session: Arc<SessionManager>,
    pub auth: Arc<AuthFlow>,
    pub devices: Arc<DeviceRegistry>,
    pub catalog: Arc<CatalogClient>,
    pub playback: Arc<PlaybackController>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Wire up every component from the process configuration
    ///
    /// `endpoints` and `annotate_url` default to the real services in
    /// production; tests hand in the addresses of local fakes.
    pub fn build(config: &Config, endpoints: Endpoints, annotate_url: String) -> Result<Self> {
        let store = Arc::new(SettingsStore::open(&config.store_path)?);

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let credentials = ClientCredentials {
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
        };
        let token_endpoint =
            TokenEndpoint::new(http.clone(), endpoints.token_url.clone(), credentials);

        let session = Arc::new(SessionManager::new(store.clone(), token_endpoint.clone()));
        let auth = Arc::new(AuthFlow::new(
            session.clone(),
            token_endpoint,
            endpoints.authorize_url.clone(),
            config.redirect_uri.clone(),
            config.spotify_client_id.clone(),
        ));
        let devices = Arc::new(DeviceRegistry::new(
            session.clone(),
            store.clone(),
            http.clone(),
            endpoints.devices_url.clone(),
            config.hide_restricted_devices,
        ));
        let catalog = Arc::new(CatalogClient::new(
            session.clone(),
            http.clone(),
            endpoints.search_url.clone(),
        ));
        let playback = Arc::new(PlaybackController::new(
            session.clone(),
            store.clone(),
            http.clone(),
            endpoints.play_url.clone(),
        ));

        let camera = Camera::new(config.camera_command.clone(), config.still_image.clone());
        let recognizer = Recognizer::new(http, annotate_url);
        let pipeline = Arc::new(Pipeline::new(
            camera,
            recognizer,
            catalog.clone(),
            playback.clone(),
        ));

        Ok(Self {
            store,
            session,
            auth,
            devices,
            catalog,
            playback,
            pipeline,
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::setup_page))
        .route("/spotify/auth", get(api::begin_auth))
        .route("/spotify/callback", get(api::auth_callback))
        .route("/spotify/player/options", get(api::player_options))
        .route("/spotify/player/select", get(api::player_select))
        .route("/do", get(api::run_pipeline))
        .merge(api::health_routes())
        .with_state(state)
}
