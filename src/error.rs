use axum::http::StatusCode;
use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("No valid token. Please log in.")]
    #[diagnostic(code(brambleberry::no_credentials))]
    NoCredentials,

    #[error("Failed to refresh access token: {0}")]
    #[diagnostic(code(brambleberry::refresh_failed))]
    RefreshFailed(String),

    #[error("Token expired and refresh failed. Please log in again.")]
    #[diagnostic(code(brambleberry::reauth_required))]
    ReauthRequired,

    #[error("Failed to fetch events from {calendar}: {reason}")]
    #[diagnostic(code(brambleberry::fetch_failed))]
    FetchFailed { calendar: String, reason: String },

    #[error("Failed to parse event start: {0}")]
    #[diagnostic(code(brambleberry::parse_failed))]
    ParseFailed(String),

    #[error("Failed to exchange authorization code: {0}")]
    #[diagnostic(code(brambleberry::token_exchange))]
    TokenExchange(String),

    #[error("Missing authorization code.")]
    #[diagnostic(code(brambleberry::missing_code))]
    MissingCode,

    #[error("Invalid OAuth state.")]
    #[diagnostic(code(brambleberry::invalid_state))]
    InvalidState,

    #[error("Environment error: {0}")]
    #[diagnostic(code(brambleberry::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(brambleberry::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(brambleberry::http))]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    #[diagnostic(code(brambleberry::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(brambleberry::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(brambleberry::other))]
    Other(String),
}

impl Error {
    /// Message placed in the `error` field of JSON responses
    pub fn public_message(&self) -> String {
        match self {
            Error::NoCredentials | Error::RefreshFailed(_) => Error::NoCredentials.to_string(),
            other => other.to_string(),
        }
    }

    /// Status code used when errors are reported with conventional HTTP semantics
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NoCredentials | Error::RefreshFailed(_) | Error::ReauthRequired => {
                StatusCode::UNAUTHORIZED
            }
            Error::MissingCode | Error::InvalidState => StatusCode::BAD_REQUEST,
            Error::FetchFailed { .. }
            | Error::ParseFailed(_)
            | Error::TokenExchange(_)
            | Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create refresh errors
pub fn refresh_error(message: &str) -> Error {
    Error::RefreshFailed(message.to_string())
}

/// Helper to create token exchange errors
pub fn exchange_error(message: &str) -> Error {
    Error::TokenExchange(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
