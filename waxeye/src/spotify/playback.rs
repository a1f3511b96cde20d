//! Playback control
//!
//! Issues the play command against the selected device. The no-device check
//! runs before anything else: a misconfigured system must fail without
//! contacting the token endpoint or the provider.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::info;
use waxeye_common::{Error, Result, SettingsStore};

use super::session::SessionManager;
use super::KEY_SELECTED_PLAYER;

#[derive(Debug, Serialize)]
struct PlayRequest<'a> {
    context_uri: &'a str,
}

pub struct PlaybackController {
    session: Arc<SessionManager>,
    store: Arc<SettingsStore>,
    http: reqwest::Client,
    play_url: String,
}

impl PlaybackController {
    pub fn new(
        session: Arc<SessionManager>,
        store: Arc<SettingsStore>,
        http: reqwest::Client,
        play_url: String,
    ) -> Self {
        Self {
            session,
            store,
            http,
            play_url,
        }
    }

    /// Start playback of `context_uri` on the selected device
    ///
    /// Only an empty 204 response counts as success; anything else is an
    /// [`Error::Api`] carrying status and body for diagnosis.
    pub async fn play(&self, context_uri: &str) -> Result<()> {
        let device_id = self
            .store
            .get(KEY_SELECTED_PLAYER)
            .filter(|id| !id.is_empty())
            .ok_or(Error::NoPlayer)?;

        let token = self.session.access_token().await?;

        let response = self
            .http
            .put(&self.play_url)
            .query(&[("device_id", device_id.as_str())])
            .bearer_auth(&token)
            .json(&PlayRequest { context_uri })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!("playback started: {} on device {}", context_uri, device_id);
        Ok(())
    }
}
