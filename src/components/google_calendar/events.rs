use super::classify::classify_events;
use super::handle::TokenHandle;
use super::models::{CalendarEvent, ClassifiedEvents, EventsPage};
use super::time::{month_window, MonthWindow};
use crate::config::{Config, UnauthorizedPolicy};
use crate::error::{config_error, AppResult, Error};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Upper bound the provider accepts for one events page
pub const MAX_RESULTS: u32 = 2500;

/// What a single calendar fetch produced
#[derive(Debug)]
enum FetchOutcome {
    Events(Vec<CalendarEvent>),
    Unauthorized,
    Failed(String),
}

/// Fetches this month's events from every configured calendar and classifies them
#[derive(Clone)]
pub struct EventAggregator {
    config: Arc<Config>,
    client: Client,
    tokens: TokenHandle,
}

impl EventAggregator {
    pub fn new(config: Arc<Config>, client: Client, tokens: TokenHandle) -> Self {
        Self {
            config,
            client,
            tokens,
        }
    }

    /// Merge and classify the current month's events
    pub async fn get_combined_events(&self) -> AppResult<ClassifiedEvents> {
        self.get_combined_events_at(Utc::now()).await
    }

    /// Same as `get_combined_events` with an explicit clock
    pub async fn get_combined_events_at(&self, now: DateTime<Utc>) -> AppResult<ClassifiedEvents> {
        let mut token = self.tokens.ensure_access_token().await.map_err(|e| {
            warn!("No usable access token: {}", e);
            match e {
                Error::NoCredentials | Error::RefreshFailed(_) => e,
                other => Error::RefreshFailed(other.to_string()),
            }
        })?;

        let window = month_window(now)?;
        let mut all_events = Vec::new();

        for calendar_id in &self.config.calendar_ids {
            info!("Fetching events from calendar: {}", calendar_id);

            match self.fetch_calendar(calendar_id, &window, &token).await? {
                FetchOutcome::Events(events) => {
                    info!("Fetched {} events from {}", events.len(), calendar_id);
                    all_events.extend(events);
                }
                FetchOutcome::Unauthorized => match self.config.on_unauthorized {
                    UnauthorizedPolicy::Skip => {
                        error!(
                            "Unauthorized access to {}. Token might have expired.",
                            calendar_id
                        );
                    }
                    UnauthorizedPolicy::RefreshAndRetry => {
                        warn!("Unauthorized access to {}, refreshing token", calendar_id);
                        token = self
                            .tokens
                            .refresh_access_token(&token)
                            .await
                            .map_err(|e| {
                                error!("Token refresh after 401 failed: {}", e);
                                Error::ReauthRequired
                            })?;

                        match self.fetch_calendar(calendar_id, &window, &token).await? {
                            FetchOutcome::Events(events) => {
                                info!(
                                    "Fetched {} events from {} after refresh",
                                    events.len(),
                                    calendar_id
                                );
                                all_events.extend(events);
                            }
                            FetchOutcome::Unauthorized => {
                                error!("Still unauthorized for {} after refresh", calendar_id);
                                return Err(Error::ReauthRequired);
                            }
                            FetchOutcome::Failed(reason) => {
                                error!("Retry for {} failed: {}", calendar_id, reason);
                                return Err(Error::ReauthRequired);
                            }
                        }
                    }
                },
                FetchOutcome::Failed(reason) => {
                    let failure = Error::FetchFailed {
                        calendar: calendar_id.clone(),
                        reason,
                    };
                    error!("{}", failure);
                }
            }
        }

        classify_events(
            all_events,
            &self.config.important_phrases,
            now.date_naive(),
            self.config.on_invalid_start,
        )
    }

    /// GET one calendar's events for the window
    async fn fetch_calendar(
        &self,
        calendar_id: &str,
        window: &MonthWindow,
        token: &str,
    ) -> AppResult<FetchOutcome> {
        let url = self.events_url(calendar_id, window)?;

        let response = match self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(FetchOutcome::Failed(format!("request error: {}", e))),
        };

        match response.status() {
            StatusCode::OK => {
                let page: EventsPage = match response.json().await {
                    Ok(page) => page,
                    Err(e) => {
                        return Ok(FetchOutcome::Failed(format!(
                            "Failed to parse events response: {}",
                            e
                        )))
                    }
                };
                Ok(FetchOutcome::Events(page.items))
            }
            StatusCode::UNAUTHORIZED => Ok(FetchOutcome::Unauthorized),
            status => {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error response".to_string());
                Ok(FetchOutcome::Failed(format!("HTTP {} - {}", status, error_body)))
            }
        }
    }

    fn events_url(&self, calendar_id: &str, window: &MonthWindow) -> AppResult<Url> {
        let mut url = Url::parse(&self.config.endpoints.calendar_api)
            .map_err(|e| config_error(&format!("Failed to parse URL: {}", e)))?;

        // Calendar ids may contain '#', '/' or '?', so they go in as an encoded segment
        url.path_segments_mut()
            .map_err(|_| config_error("Calendar API URL cannot be a base"))?
            .pop_if_empty()
            .push("calendars")
            .push(calendar_id)
            .push("events");

        url.query_pairs_mut()
            .append_pair("timeMin", &window.time_min())
            .append_pair("timeMax", &window.time_max())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("maxResults", &MAX_RESULTS.to_string());

        Ok(url)
    }
}
