mod actor;
pub mod classify;
pub mod events;
mod handle;
pub mod models;
pub mod oauth;
pub mod store;
pub mod time;
pub mod token;

pub use events::EventAggregator;
pub use handle::TokenHandle;
pub use models::{CalendarEvent, ClassifiedEvents};
pub use oauth::OAuthClient;

use crate::config::Config;
use crate::error::{other_error, AppResult};
use reqwest::Client;
use std::sync::Arc;

/// Token manager and event aggregator sharing one HTTP client
#[derive(Clone)]
pub struct GoogleCalendar {
    pub oauth: OAuthClient,
    pub tokens: TokenHandle,
    pub events: EventAggregator,
}

impl GoogleCalendar {
    /// Wire up the Google Calendar component and spawn its token actor
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| other_error(&format!("Failed to build HTTP client: {}", e)))?;

        let oauth = OAuthClient::new(Arc::clone(&config), client.clone());
        let tokens = TokenHandle::new(oauth.clone(), store::store_for(&config.token_storage));
        let events = EventAggregator::new(config, client, tokens.clone());

        Ok(Self {
            oauth,
            tokens,
            events,
        })
    }

    /// Stop the token actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.tokens.shutdown().await
    }
}
