#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use brambleberry::config::{Config, Endpoints, TokenStorage};
use brambleberry::server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PRIMARY: &str = "primary-cal";
pub const TEAM: &str = "team-cal";

/// Config pointing every provider endpoint at the mock server
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::with_credentials(
        "test-client",
        "test-secret",
        "http://localhost:8000/oauth2callback",
    );
    config.endpoints = Endpoints {
        auth_url: format!("{}/o/oauth2/v2/auth", server.uri()),
        token_url: format!("{}/token", server.uri()),
        calendar_api: format!("{}/calendar/v3", server.uri()),
    };
    config.calendar_ids = vec![PRIMARY.to_string(), TEAM.to_string()];
    config.important_phrases = vec!["urgent".to_string(), "deadline".to_string()];
    config.token_storage = TokenStorage::Memory;
    config
}

pub fn app(config: Config) -> Router {
    router(AppState::new(config).expect("app state"))
}

pub async fn send(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = send(app, uri).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub fn events_path(calendar: &str) -> String {
    format!("/calendar/v3/calendars/{}/events", calendar)
}

pub fn items(events: Vec<Value>) -> Value {
    json!({ "kind": "calendar#events", "items": events })
}

pub fn summaries(events: &Value) -> Vec<String> {
    events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["summary"].as_str().unwrap_or("").to_string())
        .collect()
}

/// Authorization-code grant answering with the given tokens
pub async fn mount_code_exchange(server: &MockServer, access: &str, refresh: Option<&str>) {
    let mut body = json!({ "access_token": access, "expires_in": 3599, "token_type": "Bearer" });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    mount_code_exchange_body(server, body).await;
}

/// Authorization-code grant answering with a raw token response
pub async fn mount_code_exchange_body(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Log in through the callback route
pub async fn login(app: &Router) {
    let (status, body) = get_json(app, "/oauth2callback?code=4%2Fabc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Logged in" }));
}
