//! Common error types for waxeye
//!
//! Defines the error taxonomy shared across the service using thiserror for
//! clear error propagation. Every fallible operation in the workflow maps to
//! exactly one of these categories so callers can tell an auth problem from a
//! provider outage without string matching.

use thiserror::Error;

/// Common result type for waxeye operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories across the capture/recognize/search/play workflow
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No session present; the operator has not completed authorization
    #[error("Not authenticated with the music provider")]
    NotAuthenticated,

    /// Authorization callback carried a state value that was never issued
    /// or was already consumed
    #[error("Authorization state mismatch")]
    StateMismatch,

    /// Token endpoint rejected the exchange or returned incomplete data
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    /// Refresh-token grant failed; the stored session is left stale
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Non-success response from a provider endpoint
    #[error("Provider API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Catalog search yielded nothing usable
    #[error("No results found for {0}")]
    NoResults(String),

    /// Playback attempted with no device chosen
    #[error("No playback device selected")]
    NoPlayer,

    /// Capture utility failure
    #[error("Camera error: {0}")]
    Camera(String),

    /// Recognition service failure or empty result
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// A pipeline run is already in flight
    #[error("Pipeline already running")]
    PipelineBusy,

    /// Transport-level HTTP error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors the operator fixes by redoing setup rather than by
    /// looking at provider diagnostics
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Error::NotAuthenticated | Error::NoPlayer | Error::StateMismatch
        )
    }
}
