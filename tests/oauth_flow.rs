mod common;

use axum::http::{header, StatusCode};
use brambleberry::config::TokenStorage;
use brambleberry::server::states::MAX_PENDING_STATES;
use brambleberry::server::{router, AppState};
use common::*;
use serde_json::json;
use std::collections::HashMap;
use url::Url;
use wiremock::matchers::{body_string_contains, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn redirect_location(app: &axum::Router) -> Url {
    let response = send(app, "/login").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap();
    Url::parse(location).unwrap()
}

#[tokio::test]
async fn login_redirects_to_consent_screen() {
    let server = MockServer::start().await;
    let app = app(test_config(&server));

    let location = redirect_location(&app).await;
    let query: HashMap<_, _> = location.query_pairs().into_owned().collect();

    assert_eq!(location.path(), "/o/oauth2/v2/auth");
    assert_eq!(query["client_id"], "test-client");
    assert_eq!(query["redirect_uri"], "http://localhost:8000/oauth2callback");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["scope"], "https://www.googleapis.com/auth/calendar.readonly");
    assert_eq!(query["access_type"], "offline");
    assert_eq!(query["prompt"], "consent");
    assert!(!query.contains_key("state"));
}

#[tokio::test]
async fn callback_exchanges_code_and_saves_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=one-time-code"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Foauth2callback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("refresh_token.txt");
    let mut config = test_config(&server);
    config.token_storage = TokenStorage::File(token_file.clone());
    let app = app(config);

    let (status, body) = get_json(&app, "/oauth2callback?code=one-time-code").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Logged in" }));
    assert_eq!(std::fs::read_to_string(&token_file).unwrap(), "refresh-1");
}

#[tokio::test]
async fn missing_refresh_token_still_logs_in() {
    let server = MockServer::start().await;
    mount_code_exchange(&server, "access-only", None).await;
    for calendar in [PRIMARY, TEAM] {
        Mock::given(method("GET"))
            .and(path(events_path(calendar)))
            .and(header_matcher("Authorization", "Bearer access-only"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![])))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("refresh_token.txt");
    let mut config = test_config(&server);
    config.token_storage = TokenStorage::File(token_file.clone());
    let app = app(config);

    login(&app).await;
    assert!(!token_file.exists());

    let (_, body) = get_json(&app, "/events").await;
    assert_eq!(body, json!({ "important": [], "regular": [] }));
}

#[tokio::test]
async fn unwritable_token_file_does_not_fail_login() {
    let server = MockServer::start().await;
    mount_code_exchange(&server, "access-1", Some("refresh-1")).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server);
    config.token_storage = TokenStorage::File(dir.path().join("no-such-dir").join("token.txt"));

    login(&app(config)).await;
}

#[tokio::test]
async fn memory_store_refreshes_after_login() {
    let server = MockServer::start().await;
    mount_code_exchange(&server, "stale", Some("kept-in-memory")).await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=kept-in-memory"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header_matcher("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header_matcher("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![])))
        .expect(2)
        .mount(&server)
        .await;

    let app = app(test_config(&server));
    login(&app).await;

    let (_, body) = get_json(&app, "/events").await;
    assert_eq!(body, json!({ "important": [], "regular": [] }));
}

#[tokio::test]
async fn callback_without_code_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = app(test_config(&server));

    let (status, body) = get_json(&app, "/oauth2callback?error=access_denied").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": "Missing authorization code." }));
}

#[tokio::test]
async fn rejected_code_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;
    let app = app(test_config(&server));

    let (_, body) = get_json(&app, "/oauth2callback?code=used").await;
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to exchange authorization code"));
    assert!(message.contains("invalid_grant"));

    let (_, health) = get_json(&app, "/health").await;
    assert_eq!(health, json!({ "status": "ok", "logged_in": false }));
}

#[tokio::test]
async fn oauth_state_is_issued_and_checked_once() {
    let server = MockServer::start().await;
    mount_code_exchange(&server, "access-1", Some("refresh-1")).await;

    let mut config = test_config(&server);
    config.require_oauth_state = true;
    let app = app(config);

    let location = redirect_location(&app).await;
    let query: HashMap<_, _> = location.query_pairs().into_owned().collect();
    let state = query["state"].clone();
    assert_eq!(state.len(), 36);

    let (_, body) = get_json(&app, "/oauth2callback?code=abc&state=forged").await;
    assert_eq!(body, json!({ "error": "Invalid OAuth state." }));

    let (_, body) = get_json(&app, "/oauth2callback?code=abc").await;
    assert_eq!(body, json!({ "error": "Invalid OAuth state." }));

    let uri = format!("/oauth2callback?code=abc&state={}", state);
    let (_, body) = get_json(&app, &uri).await;
    assert_eq!(body, json!({ "status": "Logged in" }));

    let (_, body) = get_json(&app, &uri).await;
    assert_eq!(body, json!({ "error": "Invalid OAuth state." }));

    let (_, health) = get_json(&app, "/health").await;
    assert_eq!(health["logged_in"], true);
}

#[tokio::test]
async fn repeated_logins_keep_a_bounded_number_of_states() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.require_oauth_state = true;
    let state = AppState::new(config).unwrap();
    let app = router(state.clone());

    for _ in 0..MAX_PENDING_STATES + 50 {
        let response = send(&app, "/login").await;
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    assert_eq!(state.login_states.lock().await.len(), MAX_PENDING_STATES);
}

#[tokio::test]
async fn expired_token_reads_as_logged_out() {
    let server = MockServer::start().await;
    mount_code_exchange_body(
        &server,
        json!({ "access_token": "short-lived", "refresh_token": "refresh-1", "expires_in": 0 }),
    )
    .await;
    let app = app(test_config(&server));

    login(&app).await;

    let (_, health) = get_json(&app, "/health").await;
    assert_eq!(health, json!({ "status": "ok", "logged_in": false }));
}
