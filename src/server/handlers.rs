use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tracing::{error, info, warn};

use super::AppState;
use crate::config::Config;
use crate::error::{AppResult, Error};

/// Query parameters Google appends to the redirect
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Turn an error into the `{"error": ...}` payload
///
/// The status stays 200 unless strict HTTP errors are enabled.
pub fn error_response(config: &Config, err: Error) -> Response {
    let status = if config.strict_http_errors {
        err.status_code()
    } else {
        StatusCode::OK
    };
    (status, Json(json!({ "error": err.public_message() }))).into_response()
}

/// Redirect to the Google consent screen
pub async fn login_handler(State(state): State<AppState>) -> Response {
    info!("Login initiated");

    let oauth_state = if state.config.require_oauth_state {
        Some(state.login_states.lock().await.issue(Instant::now()))
    } else {
        None
    };

    match state.calendar.oauth.authorization_url(oauth_state.as_deref()) {
        Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response(),
        Err(e) => {
            error!("Failed to build consent URL: {}", e);
            error_response(&state.config, e)
        }
    }
}

/// Receive the authorization code and log in
pub async fn oauth_callback_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    info!("Received callback from Google");

    match complete_login(&state, params).await {
        Ok(()) => Json(json!({ "status": "Logged in" })).into_response(),
        Err(e) => {
            error!("Login failed: {}", e);
            error_response(&state.config, e)
        }
    }
}

async fn complete_login(state: &AppState, params: CallbackParams) -> AppResult<()> {
    if state.config.require_oauth_state {
        let known = match &params.state {
            Some(value) => state.login_states.lock().await.consume(value, Instant::now()),
            None => false,
        };
        if !known {
            return Err(Error::InvalidState);
        }
    }

    if let Some(provider_error) = &params.error {
        warn!("Google returned an error instead of a code: {}", provider_error);
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or(Error::MissingCode)?;

    state.calendar.tokens.complete_oauth_exchange(&code).await
}

/// This month's events split into important and regular
pub async fn events_handler(State(state): State<AppState>) -> Response {
    info!("/events endpoint called");

    match state.calendar.events.get_combined_events().await {
        Ok(events) => {
            info!(
                "Returning {} important and {} regular events",
                events.important.len(),
                events.regular.len()
            );
            Json(events).into_response()
        }
        Err(e) => {
            error!("Failed to get events: {}", e);
            error_response(&state.config, e)
        }
    }
}

/// Health check handler
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let logged_in = state.calendar.tokens.has_access_token().await.unwrap_or(false);
    Json(json!({ "status": "ok", "logged_in": logged_in })).into_response()
}
