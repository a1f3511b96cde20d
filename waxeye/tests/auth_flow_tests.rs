//! Authorization flow integration tests
//!
//! Exercises the full generate-URL → callback → code-exchange path against
//! the fake token endpoint, including the one-shot nonce semantics.

mod helpers;

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use helpers::{test_app, Reply, TestApp};
use waxeye_common::Error;

/// Pull the state nonce out of the generated authorization URL
fn issued_state(app: &TestApp) -> (String, String) {
    let url = app.state.auth.authorize_url().unwrap();
    let parsed = reqwest::Url::parse(&url).unwrap();
    let state = parsed
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    (url, state)
}

fn callback_params(state: &str, code: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert("state".to_string(), state.to_string());
    params.insert("code".to_string(), code.to_string());
    params
}

#[tokio::test]
async fn successful_callback_stores_the_session() {
    let app = test_app().await;
    app.provider.state.set_token_reply(Reply::json(serde_json::json!({
        "access_token": "granted-access",
        "refresh_token": "granted-refresh",
        "expires_in": 3600,
    })));

    let (_, state) = issued_state(&app);
    app.state
        .auth
        .handle_callback(&callback_params(&state, "auth-code-1"))
        .await
        .unwrap();

    assert!(app.state.session.is_authenticated());
    assert_eq!(
        app.state.session.access_token().await.unwrap(),
        "granted-access"
    );
    // One exchange, no refresh
    assert_eq!(app.provider.state.token_requests.load(Ordering::SeqCst), 1);

    let recorded = app.provider.state.recorded.lock().unwrap();
    let form = recorded.token_form.as_ref().unwrap();
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["code"], "auth-code-1");
    assert_eq!(form["redirect_uri"], "http://waxeye.local/spotify/callback");
}

#[tokio::test]
async fn replayed_callback_is_rejected() {
    let app = test_app().await;
    app.provider.state.set_token_reply(Reply::json(serde_json::json!({
        "access_token": "granted-access",
        "refresh_token": "granted-refresh",
        "expires_in": 3600,
    })));

    let (_, state) = issued_state(&app);
    let params = callback_params(&state, "auth-code-1");
    app.state.auth.handle_callback(&params).await.unwrap();

    // Same state again: the nonce was consumed by the first callback
    match app.state.auth.handle_callback(&params).await {
        Err(Error::StateMismatch) => {}
        other => panic!("expected StateMismatch, got {:?}", other.map(|_| ())),
    }
    assert_eq!(app.provider.state.token_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mismatched_state_allows_a_correct_retry() {
    let app = test_app().await;
    let (_, state) = issued_state(&app);

    assert!(matches!(
        app.state
            .auth
            .handle_callback(&callback_params("forged", "code"))
            .await,
        Err(Error::StateMismatch)
    ));

    // The real callback still works afterwards
    app.state
        .auth
        .handle_callback(&callback_params(&state, "code"))
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_exchange_is_an_exchange_error() {
    let app = test_app().await;
    app.provider
        .state
        .set_token_reply(Reply::status(400, r#"{"error":"invalid_grant"}"#));

    let (_, state) = issued_state(&app);
    match app
        .state
        .auth
        .handle_callback(&callback_params(&state, "bad-code"))
        .await
    {
        Err(Error::Exchange(reason)) => assert!(reason.contains("400")),
        other => panic!("expected Exchange, got {:?}", other.map(|_| ())),
    }
    assert!(!app.state.session.is_authenticated());
}

#[tokio::test]
async fn exchange_without_refresh_token_is_an_exchange_error() {
    let app = test_app().await;
    app.provider.state.set_token_reply(Reply::json(serde_json::json!({
        "access_token": "granted-access",
        "expires_in": 3600,
    })));

    let (_, state) = issued_state(&app);
    match app
        .state
        .auth
        .handle_callback(&callback_params(&state, "code"))
        .await
    {
        Err(Error::Exchange(reason)) => assert!(reason.contains("refresh token")),
        other => panic!("expected Exchange, got {:?}", other.map(|_| ())),
    }
    assert!(!app.state.session.is_authenticated());
}

#[tokio::test]
async fn fresh_authorize_url_invalidates_the_previous_attempt() {
    let app = test_app().await;
    let (_, first_state) = issued_state(&app);
    let (_, second_state) = issued_state(&app);
    assert_ne!(first_state, second_state);

    // The superseded attempt's callback no longer validates
    assert!(matches!(
        app.state
            .auth
            .handle_callback(&callback_params(&first_state, "code"))
            .await,
        Err(Error::StateMismatch)
    ));
}
