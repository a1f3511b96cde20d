//! Spotify integration
//!
//! Everything with real state lives here: the OAuth2 session (tokens and
//! expiry), the authorization flow, the selected playback device, and the
//! catalog/playback calls the pipeline makes against them.
//!
//! Provider URLs are grouped in [`Endpoints`] so tests can point the whole
//! module at a local fake provider.

pub mod auth;
pub mod catalog;
pub mod devices;
pub mod playback;
pub mod session;

pub use auth::AuthFlow;
pub use catalog::CatalogClient;
pub use devices::{Device, DeviceRegistry};
pub use playback::PlaybackController;
pub use session::{ClientCredentials, SessionManager, TokenEndpoint};

/// Persisted settings keys
pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
pub const KEY_EXPIRY: &str = "expiry";
pub const KEY_SELECTED_PLAYER: &str = "selected_player";

/// Provider endpoint URLs
///
/// Defaults to the real Spotify endpoints; integration tests override these
/// with addresses of in-process fake servers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub devices_url: String,
    pub search_url: String,
    pub play_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            devices_url: "https://api.spotify.com/v1/me/player/devices".to_string(),
            search_url: "https://api.spotify.com/v1/search".to_string(),
            play_url: "https://api.spotify.com/v1/me/player/play".to_string(),
        }
    }
}

impl Endpoints {
    /// Endpoints rooted at a single base URL (used by tests against a fake
    /// provider serving all routes)
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize_url: format!("{}/authorize", base),
            token_url: format!("{}/api/token", base),
            devices_url: format!("{}/v1/me/player/devices", base),
            search_url: format!("{}/v1/search", base),
            play_url: format!("{}/v1/me/player/play", base),
        }
    }
}
