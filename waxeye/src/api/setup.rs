//! Setup handlers: authorization and player selection
//!
//! These drive the two pieces of durable state the pipeline needs: an
//! OAuth session and a selected playback device. Both flows end back at `/`,
//! which shows whatever setup work is still pending.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::{error, warn};

use super::ui::{failure_page, render_page, Action};
use crate::AppState;

const AUTH_PROMPT: &str = "Set up your Spotify account. We'll redirect you to \
    log in to Spotify so you can approve this app.";
const PLAYER_PROMPT: &str = "We need to choose a default player for music \
    playback. You'll need to be signed into your Spotify account on that device.";

/// GET /
///
/// Lists pending setup actions, or offers the trigger link once both the
/// session and the player selection are in place.
pub async fn setup_page(State(state): State<AppState>) -> Html<String> {
    let mut actions = Vec::new();

    if !state.session.is_authenticated() {
        actions.push(Action {
            text: AUTH_PROMPT.to_string(),
            path: "/spotify/auth".to_string(),
        });
    } else if !state.devices.has_selection() {
        actions.push(Action {
            text: PLAYER_PROMPT.to_string(),
            path: "/spotify/player/options".to_string(),
        });
    }

    if actions.is_empty() {
        actions.push(Action {
            text: "Everything is set up. Put a record in front of the camera \
                   and hit go."
                .to_string(),
            path: "/do".to_string(),
        });
        render_page("You're good to go!", &actions)
    } else {
        render_page("We need to sort out some stuff...", &actions)
    }
}

/// GET /spotify/auth
///
/// Redirects the browser to the provider's authorization page.
pub async fn begin_auth(State(state): State<AppState>) -> Response {
    match state.auth.authorize_url() {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => {
            error!("failed to build authorization URL: {}", e);
            failure_page().into_response()
        }
    }
}

/// GET /spotify/callback
///
/// Completes the code exchange. Failures are logged and the operator lands
/// back on `/`, which will still show the auth action.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Redirect {
    if let Err(e) = state.auth.handle_callback(&params).await {
        error!("failed to process authorization callback: {}", e);
    }
    Redirect::temporary("/")
}

/// GET /spotify/player/options
///
/// Lists available playback devices as selection links.
pub async fn player_options(State(state): State<AppState>) -> Response {
    let devices = match state.devices.list().await {
        Ok(devices) => devices,
        Err(e) => {
            error!("failed to list playback devices: {}", e);
            return failure_page().into_response();
        }
    };

    let actions: Vec<Action> = devices
        .iter()
        .map(|device| Action {
            text: format!("{} ({})", device.name, device.kind),
            path: select_link(&device.id),
        })
        .collect();

    render_page("Choose a player below...", &actions).into_response()
}

/// GET /spotify/player/select?id=...
pub async fn player_select(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(id) = params.get("id").filter(|id| !id.is_empty()) else {
        warn!("player selection without an id");
        return failure_page().into_response();
    };

    match state.devices.select(id) {
        Ok(()) => Redirect::temporary("/").into_response(),
        Err(e) => {
            error!("failed to persist player selection: {}", e);
            failure_page().into_response()
        }
    }
}

/// Build the selection link with the device id percent-encoded
fn select_link(device_id: &str) -> String {
    let mut url = reqwest::Url::parse("http://localhost/spotify/player/select")
        .expect("static URL is valid");
    url.query_pairs_mut().append_pair("id", device_id);
    format!("{}?{}", url.path(), url.query().unwrap_or(""))
}
