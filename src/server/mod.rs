mod handlers;
pub mod states;

pub use handlers::{
    error_response, events_handler, health_handler, login_handler, oauth_callback_handler,
};
pub use states::LoginStates;

use crate::components::GoogleCalendar;
use crate::config::Config;
use crate::error::AppResult;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub calendar: GoogleCalendar,
    /// OAuth `state` values issued by `/login` and not yet used
    pub login_states: Arc<Mutex<LoginStates>>,
}

impl AppState {
    /// Build the state and spawn the token actor
    pub fn new(config: Config) -> AppResult<Self> {
        let config = Arc::new(config);
        let calendar = GoogleCalendar::new(Arc::clone(&config))?;

        Ok(Self {
            config,
            calendar,
            login_states: Arc::new(Mutex::new(LoginStates::default())),
        })
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", get(login_handler))
        .route("/oauth2callback", get(oauth_callback_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
