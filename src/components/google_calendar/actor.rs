use super::oauth::OAuthClient;
use super::store::RefreshTokenStore;
use super::token::AccessToken;
use crate::error::{refresh_error, AppResult, Error};
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Commands that can be sent to the token actor
pub enum TokenCommand {
    EnsureAccessToken(mpsc::Sender<AppResult<String>>),
    RefreshAccessToken {
        stale: Option<String>,
        respond: mpsc::Sender<AppResult<String>>,
    },
    CompleteExchange {
        code: String,
        respond: mpsc::Sender<AppResult<()>>,
    },
    HasAccessToken(mpsc::Sender<bool>),
    Shutdown,
}

/// Owns the access token and the refresh token store
///
/// Commands are handled one at a time, so a refresh can never race another
/// refresh or a code exchange.
pub struct TokenActor {
    oauth: OAuthClient,
    store: Box<dyn RefreshTokenStore>,
    access_token: Option<AccessToken>,
    command_rx: mpsc::Receiver<TokenCommand>,
}

impl TokenActor {
    /// Create a new actor and the sender for its mailbox
    pub fn new(
        oauth: OAuthClient,
        store: Box<dyn RefreshTokenStore>,
    ) -> (Self, mpsc::Sender<TokenCommand>) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            oauth,
            store,
            access_token: None,
            command_rx,
        };

        (actor, command_tx)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Token actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                TokenCommand::EnsureAccessToken(respond) => {
                    let result = self.ensure_access_token().await;
                    let _ = respond.send(result).await;
                }
                TokenCommand::RefreshAccessToken { stale, respond } => {
                    let result = self.refresh_access_token(stale.as_deref()).await;
                    let _ = respond.send(result).await;
                }
                TokenCommand::CompleteExchange { code, respond } => {
                    let result = self.complete_oauth_exchange(&code).await;
                    let _ = respond.send(result).await;
                }
                TokenCommand::HasAccessToken(respond) => {
                    let usable = self
                        .access_token
                        .as_ref()
                        .is_some_and(|token| !token.is_expired(Utc::now()));
                    let _ = respond.send(usable).await;
                }
                TokenCommand::Shutdown => {
                    info!("Token actor shutting down");
                    break;
                }
            }
        }

        info!("Token actor shut down");
    }

    /// Return the held token, refreshing when none is held or it is known to be expired
    async fn ensure_access_token(&mut self) -> AppResult<String> {
        match &self.access_token {
            Some(token) if !token.is_expired(Utc::now()) => return Ok(token.value.clone()),
            Some(_) => info!("Access token past its declared lifetime, refreshing"),
            None => warn!("No access token held, attempting to refresh"),
        }

        self.refresh_from_store().await
    }

    /// Replace a token the API rejected
    async fn refresh_access_token(&mut self, stale: Option<&str>) -> AppResult<String> {
        if let Some(current) = &self.access_token {
            if Some(current.value.as_str()) != stale && !current.is_expired(Utc::now()) {
                // Someone already refreshed since the caller got its token
                return Ok(current.value.clone());
            }
        }

        self.access_token = None;
        self.refresh_from_store().await
    }

    async fn refresh_from_store(&mut self) -> AppResult<String> {
        let refresh_token = self.store.load().await?.ok_or(Error::NoCredentials)?;

        let response = self.oauth.refresh(&refresh_token).await?;
        let value = response
            .access_token
            .ok_or_else(|| refresh_error("Token response missing 'access_token' field"))?;

        self.access_token = Some(AccessToken::new(value.clone(), response.expires_in, Utc::now()));
        Ok(value)
    }

    async fn complete_oauth_exchange(&mut self, code: &str) -> AppResult<()> {
        let response = self.oauth.exchange_code(code).await?;
        let value = response.access_token.ok_or_else(|| {
            Error::TokenExchange("Token response missing 'access_token' field".into())
        })?;

        self.access_token = Some(AccessToken::new(value, response.expires_in, Utc::now()));

        match response.refresh_token {
            Some(refresh_token) => {
                // Save failures never fail the login
                if let Err(e) = self.store.save(&refresh_token).await {
                    error!("Failed to save refresh token: {}", e);
                }
            }
            None => warn!("No refresh token received from Google"),
        }

        Ok(())
    }
}
