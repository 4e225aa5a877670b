use crate::error::{config_error, env_error, AppResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Calendars merged by `/events` when nothing else is configured
pub const DEFAULT_CALENDAR_IDS: [&str; 2] = [
    "frg50vhapanlkc10li4sjoqpc4@group.calendar.google.com",
    "1175209682ba393df2d49d97b43781dc6331d8cdd9ead63806ebd6a85a26937e@group.calendar.google.com",
];

pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_REFRESH_TOKEN_FILE: &str = "refresh_token.txt";

/// Optional file overriding the built-in calendar list
const CALENDARS_FILE: &str = "config/calendars.toml";

/// Where the refresh token lives between logins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStorage {
    /// Plaintext file, survives restarts
    File(PathBuf),
    /// Process memory only
    Memory,
}

/// What `/events` does when the calendar API answers 401
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedPolicy {
    /// Log and move on to the next calendar
    Skip,
    /// Refresh the access token once and retry the calendar
    RefreshAndRetry,
}

/// What classification does with an event whose start cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStartPolicy {
    /// Drop the event from both buckets
    Skip,
    /// Fail the whole request
    Reject,
}

/// Provider endpoints, overridable for local testing
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub auth_url: String,
    pub token_url: String,
    pub calendar_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            calendar_api: DEFAULT_CALENDAR_API.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CalendarsFile {
    calendars: Vec<String>,
}

/// Main configuration structure for the server
#[derive(Debug, Clone)]
pub struct Config {
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Redirect URI registered for the OAuth client
    pub redirect_uri: String,
    /// Lowercased phrases marking an event as important
    pub important_phrases: Vec<String>,
    /// Calendars to merge, in fetch order
    pub calendar_ids: Vec<String>,
    pub token_storage: TokenStorage,
    pub on_unauthorized: UnauthorizedPolicy,
    pub on_invalid_start: InvalidStartPolicy,
    /// Report errors with 4xx/5xx instead of 200
    pub strict_http_errors: bool,
    /// Issue and verify an OAuth `state` value
    pub require_oauth_state: bool,
    pub login_hint: Option<String>,
    /// Timeout for outbound requests, none when unset
    pub http_timeout: Option<Duration>,
    pub endpoints: Endpoints,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Configuration with the given credentials and every option at its default
    pub fn with_credentials(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self {
            google_client_id: client_id.to_string(),
            google_client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            important_phrases: Vec::new(),
            calendar_ids: DEFAULT_CALENDAR_IDS.iter().map(|id| id.to_string()).collect(),
            token_storage: TokenStorage::File(PathBuf::from(DEFAULT_REFRESH_TOKEN_FILE)),
            on_unauthorized: UnauthorizedPolicy::RefreshAndRetry,
            on_invalid_start: InvalidStartPolicy::Skip,
            strict_http_errors: false,
            require_oauth_state: false,
            login_hint: None,
            http_timeout: None,
            endpoints: Endpoints::default(),
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }

    /// Load configuration from `.env`, the process environment and the calendars file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_lookup(|key| env::var(key).ok())?;

        // The file only applies when CALENDAR_IDS did not already pick the list
        if env::var("CALENDAR_IDS").is_err() {
            if let Ok(content) = fs::read_to_string(CALENDARS_FILE) {
                let file: CalendarsFile = toml::from_str(&content)?;
                if !file.calendars.is_empty() {
                    config.calendar_ids = file.calendars;
                }
            }
        }

        Ok(config)
    }

    /// Build a configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| env_error(key))
        };

        let mut config = Self::with_credentials(
            &required("GOOGLE_CLIENT_ID")?,
            &required("GOOGLE_CLIENT_SECRET")?,
            &required("REDIRECT_URI")?,
        );

        config.important_phrases = parse_phrases(&lookup("IMPORTANT_PHRASES").unwrap_or_default());

        if let Some(ids) = lookup("CALENDAR_IDS") {
            let ids = split_list(&ids);
            if !ids.is_empty() {
                config.calendar_ids = ids;
            }
        }

        let token_file = lookup("REFRESH_TOKEN_FILE")
            .unwrap_or_else(|| DEFAULT_REFRESH_TOKEN_FILE.to_string());
        config.token_storage = match lookup("REFRESH_TOKEN_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("file") => TokenStorage::File(PathBuf::from(token_file)),
            Some("memory") => TokenStorage::Memory,
            Some(other) => {
                return Err(config_error(&format!("Unknown REFRESH_TOKEN_STORE: {}", other)))
            }
        };

        config.on_unauthorized = match lookup("ON_UNAUTHORIZED").as_deref().map(str::trim) {
            None | Some("") | Some("refresh") => UnauthorizedPolicy::RefreshAndRetry,
            Some("skip") => UnauthorizedPolicy::Skip,
            Some(other) => return Err(config_error(&format!("Unknown ON_UNAUTHORIZED: {}", other))),
        };

        config.on_invalid_start = match lookup("ON_INVALID_START").as_deref().map(str::trim) {
            None | Some("") | Some("skip") => InvalidStartPolicy::Skip,
            Some("reject") => InvalidStartPolicy::Reject,
            Some(other) => {
                return Err(config_error(&format!(
                    "Unknown ON_INVALID_START: {}",
                    other
                )))
            }
        };

        config.strict_http_errors =
            parse_flag(lookup("STRICT_HTTP_ERRORS"), "STRICT_HTTP_ERRORS")?;
        config.require_oauth_state =
            parse_flag(lookup("REQUIRE_OAUTH_STATE"), "REQUIRE_OAUTH_STATE")?;
        config.login_hint = lookup("LOGIN_HINT").filter(|hint| !hint.trim().is_empty());

        if let Some(secs) = lookup("HTTP_TIMEOUT_SECS") {
            let secs = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| config_error("Invalid HTTP_TIMEOUT_SECS format"))?;
            config.http_timeout = Some(Duration::from_secs(secs));
        }

        if let Some(url) = lookup("GOOGLE_AUTH_URL") {
            config.endpoints.auth_url = url;
        }
        if let Some(url) = lookup("GOOGLE_TOKEN_URL") {
            config.endpoints.token_url = url;
        }
        if let Some(url) = lookup("GOOGLE_CALENDAR_API") {
            config.endpoints.calendar_api = url;
        }

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| config_error("Invalid PORT format"))?;
        }

        Ok(config)
    }
}

/// Split a comma-separated phrase list into trimmed, lowercased, non-empty phrases
pub fn parse_phrases(raw: &str) -> Vec<String> {
    split_list(raw).into_iter().map(|p| p.to_lowercase()).collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(value: Option<String>, name: &str) -> AppResult<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(_) => Err(config_error(&format!("Invalid {} value", name))),
    }
}
