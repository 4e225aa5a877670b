use super::models::TokenResponse;
use crate::config::Config;
use crate::error::{config_error, exchange_error, refresh_error, AppResult};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

/// Read-only calendar access
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Talks to the provider's consent page and token endpoint
#[derive(Clone)]
pub struct OAuthClient {
    config: Arc<Config>,
    client: Client,
}

impl OAuthClient {
    pub fn new(config: Arc<Config>, client: Client) -> Self {
        Self { config, client }
    }

    /// Consent URL asking for offline, read-only calendar access
    pub fn authorization_url(&self, state: Option<&str>) -> AppResult<Url> {
        let mut url = Url::parse(&self.config.endpoints.auth_url)
            .map_err(|e| config_error(&format!("Invalid GOOGLE_AUTH_URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.google_client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", CALENDAR_SCOPE)
                .append_pair("access_type", "offline")
                .append_pair("prompt", "consent");
            if let Some(hint) = &self.config.login_hint {
                query.append_pair("login_hint", hint);
            }
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }

        Ok(url)
    }

    /// Trade a one-time authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> AppResult<TokenResponse> {
        let params = [
            ("code", code),
            ("client_id", self.config.google_client_id.as_str()),
            ("client_secret", self.config.google_client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(&self.config.endpoints.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| exchange_error(&format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            error!("Failed to exchange code: HTTP {} - {}", status, error_body);
            return Err(exchange_error(&format!("HTTP {} - {}", status, error_body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| exchange_error(&format!("Failed to parse token response: {}", e)))?;

        if token.access_token.is_none() {
            return Err(exchange_error("Token response missing 'access_token' field"));
        }

        info!("New access token obtained");
        Ok(token)
    }

    /// Obtain a new access token with the refresh-token grant
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        info!("Attempting to refresh access token");

        let params = [
            ("client_id", self.config.google_client_id.as_str()),
            ("client_secret", self.config.google_client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.config.endpoints.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| refresh_error(&format!("Token request failed: {}", e)))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            error!("Failed to refresh token: HTTP {} - {}", status, error_body);
            return Err(refresh_error(&format!("HTTP {} - {}", status, error_body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| refresh_error(&format!("Failed to parse token response: {}", e)))?;

        if token.access_token.is_none() {
            return Err(refresh_error("Token response missing 'access_token' field"));
        }

        info!("Access token refreshed successfully");
        Ok(token)
    }
}
