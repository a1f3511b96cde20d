//! OAuth session management
//!
//! Owns the stored access/refresh token pair and its expiry. The one rule
//! that matters: `access_token()` hands out a valid token and performs at
//! most one refresh exchange no matter how many callers ask concurrently.
//! The whole check-then-refresh sequence runs inside a single async mutex,
//! so a second caller observing an expired token blocks until the first
//! caller's refresh lands, then reads the fresh token from the store.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use waxeye_common::{Error, Result, SettingsStore};

use super::{KEY_ACCESS_TOKEN, KEY_EXPIRY, KEY_REFRESH_TOKEN};

/// Textual format of the persisted expiry timestamp (UTC)
const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Registered application credentials for the provider
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Token endpoint client
///
/// Issues form-encoded grants with HTTP basic authentication. Shared between
/// the session manager (refresh grants) and the auth flow (code exchange).
#[derive(Clone)]
pub struct TokenEndpoint {
    http: reqwest::Client,
    url: String,
    credentials: ClientCredentials,
}

/// Token endpoint response
///
/// `refresh_token` is present on the initial exchange and optional on
/// refresh; `expires_in` is in seconds.
#[derive(Debug, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenEndpoint {
    pub fn new(http: reqwest::Client, url: String, credentials: ClientCredentials) -> Self {
        Self {
            http,
            url,
            credentials,
        }
    }

    /// Exchange an authorization code for the initial token pair
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant> {
        self.request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(form)
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

        Ok(serde_json::from_str(&body)?)
    }
}

/// Process-wide OAuth session, backed by the settings store
pub struct SessionManager {
    store: Arc<SettingsStore>,
    token_endpoint: TokenEndpoint,
    /// Serializes the check-expiry-and-refresh sequence; only one refresh
    /// exchange may be in flight at a time
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: Arc<SettingsStore>, token_endpoint: TokenEndpoint) -> Self {
        Self {
            store,
            token_endpoint,
            refresh_lock: Mutex::new(()),
        }
    }

    /// True when an access token is stored, regardless of freshness
    pub fn is_authenticated(&self) -> bool {
        self.store.contains(KEY_ACCESS_TOKEN)
    }

    /// Persist a freshly granted token pair
    ///
    /// Called by the auth flow after a successful code exchange. The expiry
    /// is stored as an absolute timestamp computed from `expires_in`.
    pub fn store_tokens(&self, access: &str, refresh: &str, expires_in: i64) -> Result<()> {
        self.write_session(Utc::now(), access, Some(refresh), expires_in)
    }

    /// Return a valid access token, refreshing it first if expired
    ///
    /// Fails with [`Error::NotAuthenticated`] when no session exists and
    /// with [`Error::TokenRefresh`] when the refresh grant fails; in the
    /// latter case the stored session is left untouched, so the next caller
    /// retries the refresh rather than finding a half-written session.
    pub async fn access_token(&self) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        let token = self
            .store
            .get(KEY_ACCESS_TOKEN)
            .filter(|t| !t.is_empty())
            .ok_or(Error::NotAuthenticated)?;

        if !self.is_expired() {
            return Ok(token);
        }

        info!("access token expired, refreshing");
        self.refresh_session().await
    }

    /// Perform one refresh-token grant and update the stored session.
    /// Caller must hold `refresh_lock`.
    async fn refresh_session(&self) -> Result<String> {
        let refresh_token = self
            .store
            .get(KEY_REFRESH_TOKEN)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::TokenRefresh("no refresh token stored".to_string()))?;

        let request_time = Utc::now();
        let grant = self
            .token_endpoint
            .refresh(&refresh_token)
            .await
            .map_err(|e| Error::TokenRefresh(e.to_string()))?;

        if grant.access_token.is_empty() {
            return Err(Error::TokenRefresh("access token not returned".to_string()));
        }

        // The provider may rotate the refresh token; keep the old one unless
        // a replacement arrived.
        let new_refresh = grant
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty());
        self.write_session(request_time, &grant.access_token, new_refresh, grant.expires_in)?;

        debug!("session refreshed, expires in {}s", grant.expires_in);
        Ok(grant.access_token)
    }

    fn write_session(
        &self,
        request_time: DateTime<Utc>,
        access: &str,
        refresh: Option<&str>,
        expires_in: i64,
    ) -> Result<()> {
        let expiry = request_time + Duration::seconds(expires_in);
        self.store
            .set(KEY_EXPIRY, &expiry.format(EXPIRY_FORMAT).to_string())?;
        self.store.set(KEY_ACCESS_TOKEN, access)?;
        if let Some(refresh) = refresh {
            self.store.set(KEY_REFRESH_TOKEN, refresh)?;
        }
        Ok(())
    }

    /// An absent or unparseable expiry counts as expired; a successful
    /// refresh rewrites it in the expected format.
    fn is_expired(&self) -> bool {
        let Some(raw) = self.store.get(KEY_EXPIRY) else {
            return true;
        };
        match parse_expiry(&raw) {
            Some(expiry) => expiry <= Utc::now(),
            None => {
                warn!("stored expiry {:?} is unparseable, treating as expired", raw);
                true
            }
        }
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, EXPIRY_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
