//! Catalog search
//!
//! Resolves free-text input (whatever the recognizer guessed from the
//! photograph) to a playable context URI. Album results win over track
//! results: the point of the workflow is to play a whole record, and a
//! track's parent album is an acceptable fallback.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use waxeye_common::{Error, Result};

use super::session::SessionManager;

/// Fixed cap on results requested per type
const SEARCH_RESULT_LIMIT: u32 = 5;

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    albums: AlbumList,
    #[serde(default)]
    tracks: TrackList,
}

#[derive(Debug, Default, Deserialize)]
struct AlbumList {
    #[serde(default)]
    items: Vec<AlbumRef>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackList {
    #[serde(default)]
    items: Vec<TrackRef>,
}

#[derive(Debug, Default, Deserialize)]
struct AlbumRef {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct TrackRef {
    album: AlbumRef,
}

pub struct CatalogClient {
    session: Arc<SessionManager>,
    http: reqwest::Client,
    search_url: String,
}

impl CatalogClient {
    pub fn new(session: Arc<SessionManager>, http: reqwest::Client, search_url: String) -> Self {
        Self {
            session,
            http,
            search_url,
        }
    }

    /// Resolve free text to an album context URI
    ///
    /// Queries album and track result types together; returns the first
    /// album's URI, else the album URI of the first track, else
    /// [`Error::NoResults`].
    pub async fn search_album(&self, text: &str) -> Result<String> {
        let token = self.session.access_token().await?;

        let limit = SEARCH_RESULT_LIMIT.to_string();
        let response = self
            .http
            .get(&self.search_url)
            .bearer_auth(&token)
            .query(&[
                ("q", text),
                ("type", "album,track"),
                ("limit", limit.as_str()),
            ])
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

        let parsed: SearchResponse = serde_json::from_str(&body)?;
        debug!(
            "search for {:?}: {} albums, {} tracks",
            text,
            parsed.albums.items.len(),
            parsed.tracks.items.len()
        );

        if let Some(album) = parsed.albums.items.first() {
            return Ok(album.uri.clone());
        }
        if let Some(track) = parsed.tracks.items.first() {
            return Ok(track.album.uri.clone());
        }

        Err(Error::NoResults(text.to_string()))
    }
}
