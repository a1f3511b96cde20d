//! Process configuration
//!
//! Everything comes from the command line or the environment; there is no
//! config file tier. The Spotify client credentials are required and the
//! process must not start without them, so they are non-optional arguments.
//! The recognition API key is deliberately NOT here: the vision collaborator
//! reads it lazily per call.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Photograph a record sleeve, recognize it, play it on Spotify
#[derive(Debug, Parser)]
#[command(name = "waxeye", version)]
pub struct Config {
    /// Spotify application client id (required)
    #[arg(long, env = "WAXEYE_SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: String,

    /// Spotify application client secret (required)
    #[arg(long, env = "WAXEYE_SPOTIFY_CLIENT_SECRET")]
    pub spotify_client_secret: String,

    /// Address the HTTP server listens on
    #[arg(long, env = "WAXEYE_LISTEN_ADDR", default_value = "0.0.0.0:80")]
    pub listen_addr: String,

    /// Path of the persistent settings file
    #[arg(long, env = "WAXEYE_STORE_PATH", default_value = "settings.json")]
    pub store_path: PathBuf,

    /// Redirect URI registered with the provider for the auth callback
    #[arg(
        long,
        env = "WAXEYE_REDIRECT_URI",
        default_value = "http://waxeye.local/spotify/callback"
    )]
    pub redirect_uri: String,

    /// Timeout applied to every outbound HTTP call, in seconds
    #[arg(long, env = "WAXEYE_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Exclude devices the provider marks restricted from the listing
    #[arg(long, env = "WAXEYE_HIDE_RESTRICTED_DEVICES")]
    pub hide_restricted_devices: bool,

    /// External capture command; `{output}` is replaced with a JPEG path
    #[arg(long, env = "WAXEYE_CAMERA_COMMAND")]
    pub camera_command: Option<String>,

    /// Still image used instead of the camera when no command is set
    #[arg(long, env = "WAXEYE_STILL_IMAGE")]
    pub still_image: Option<PathBuf>,
}

impl Config {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
