//! Authorization-code flow
//!
//! Issues the provider authorization URL with a single-use anti-forgery
//! state nonce and completes the code exchange on callback. Only one
//! authorization attempt may be outstanding at a time: each call to
//! [`AuthFlow::authorize_url`] overwrites the previous nonce, and a process
//! restart invalidates an in-flight attempt.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};
use waxeye_common::{Error, Result};

use super::session::{SessionManager, TokenEndpoint};

/// Scopes required by the workflow: start playback, read player state,
/// search the catalog
const REQUIRED_SCOPES: &[&str] = &[
    "user-modify-playback-state",
    "user-read-playback-state",
    "user-read-private",
];

const STATE_NONCE_LEN: usize = 32;

/// OAuth authorization-code flow
pub struct AuthFlow {
    session: Arc<SessionManager>,
    token_endpoint: TokenEndpoint,
    authorize_url: String,
    redirect_uri: String,
    client_id: String,
    /// Single-slot in-flight state nonce
    pending_state: Mutex<Option<String>>,
}

impl AuthFlow {
    pub fn new(
        session: Arc<SessionManager>,
        token_endpoint: TokenEndpoint,
        authorize_url: String,
        redirect_uri: String,
        client_id: String,
    ) -> Self {
        Self {
            session,
            token_endpoint,
            authorize_url,
            redirect_uri,
            client_id,
            pending_state: Mutex::new(None),
        }
    }

    /// Build the provider authorization URL, minting a fresh state nonce
    ///
    /// Overwrites any previous in-flight nonce.
    pub fn authorize_url(&self) -> Result<String> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_NONCE_LEN)
            .map(char::from)
            .collect();

        let scope = REQUIRED_SCOPES.join(" ");
        let url = reqwest::Url::parse_with_params(
            &self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("scope", scope.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", nonce.as_str()),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid authorize URL: {}", e)))?;

        *self.pending_state.lock().expect("auth state lock poisoned") = Some(nonce);

        Ok(url.into())
    }

    /// Complete the flow from the callback query parameters
    ///
    /// Validates the state nonce (consumed on match, kept on mismatch so a
    /// correct retry is still possible), extracts the code, exchanges it for
    /// tokens, and stores them on the session.
    pub async fn handle_callback(&self, params: &HashMap<String, String>) -> Result<()> {
        let returned = params.get("state").map(String::as_str).unwrap_or("");
        {
            let mut slot = self.pending_state.lock().expect("auth state lock poisoned");
            match slot.as_deref() {
                Some(expected) if !returned.is_empty() && expected == returned => {
                    // Valid exactly once
                    slot.take();
                }
                _ => {
                    warn!("callback state did not match the issued nonce");
                    return Err(Error::StateMismatch);
                }
            }
        }

        let code = params
            .get("code")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                let reason = params
                    .get("error")
                    .map(String::as_str)
                    .unwrap_or("no code in callback");
                Error::Exchange(reason.to_string())
            })?;

        let grant = self
            .token_endpoint
            .exchange_code(code, &self.redirect_uri)
            .await
            .map_err(|e| Error::Exchange(e.to_string()))?;

        let refresh = grant
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Exchange("refresh token not returned".to_string()))?;
        if grant.access_token.is_empty() {
            return Err(Error::Exchange("access token not returned".to_string()));
        }

        self.session
            .store_tokens(&grant.access_token, refresh, grant.expires_in)?;
        info!("authorization complete, session stored");
        Ok(())
    }

    #[cfg(test)]
    fn pending_state(&self) -> Option<String> {
        self.pending_state.lock().unwrap().clone()
    }
}
