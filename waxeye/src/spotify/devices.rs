//! Playback device listing and selection
//!
//! Devices are transient: each listing reflects what the provider reports
//! right now. The chosen device id is persisted as `selected_player` and is
//! not validated against the current listing; the provider validates it at
//! play time.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use waxeye_common::{Error, Result, SettingsStore};

use super::session::SessionManager;
use super::KEY_SELECTED_PLAYER;

/// A playback target as reported by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "is_restricted", default)]
    pub restricted: bool,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<Device>,
}

pub struct DeviceRegistry {
    session: Arc<SessionManager>,
    store: Arc<SettingsStore>,
    http: reqwest::Client,
    devices_url: String,
    /// Policy flag: drop devices the provider marks `is_restricted`.
    /// Restricted devices reject playback commands from the Web API, but
    /// listing them keeps the choice visible to the operator, so the default
    /// is to include them.
    hide_restricted: bool,
}

impl DeviceRegistry {
    pub fn new(
        session: Arc<SessionManager>,
        store: Arc<SettingsStore>,
        http: reqwest::Client,
        devices_url: String,
        hide_restricted: bool,
    ) -> Self {
        Self {
            session,
            store,
            http,
            devices_url,
            hide_restricted,
        }
    }

    /// List available playback devices, in provider order
    pub async fn list(&self) -> Result<Vec<Device>> {
        let token = self.session.access_token().await?;

        let response = self
            .http
            .get(&self.devices_url)
            .bearer_auth(&token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DevicesResponse = serde_json::from_str(&body)?;
        debug!("provider reported {} devices", parsed.devices.len());

        if self.hide_restricted {
            Ok(parsed
                .devices
                .into_iter()
                .filter(|d| !d.restricted)
                .collect())
        } else {
            Ok(parsed.devices)
        }
    }

    /// Persist the operator's chosen playback target
    pub fn select(&self, device_id: &str) -> Result<()> {
        self.store.set(KEY_SELECTED_PLAYER, device_id)
    }

    pub fn has_selection(&self) -> bool {
        self.store.contains(KEY_SELECTED_PLAYER)
    }
}
