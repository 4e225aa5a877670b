use super::actor::{TokenActor, TokenCommand};
use super::oauth::OAuthClient;
use super::store::RefreshTokenStore;
use crate::error::{other_error, AppResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle for interacting with the token actor
#[derive(Clone)]
pub struct TokenHandle {
    command_tx: mpsc::Sender<TokenCommand>,
    _actor_task: Arc<JoinHandle<()>>,
}

impl TokenHandle {
    /// Create a new TokenHandle and spawn the actor
    pub fn new(oauth: OAuthClient, store: Box<dyn RefreshTokenStore>) -> Self {
        let (mut actor, command_tx) = TokenActor::new(oauth, store);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            command_tx,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Get a usable access token, refreshing from the stored refresh token if needed
    pub async fn ensure_access_token(&self) -> AppResult<String> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.send(TokenCommand::EnsureAccessToken(response_tx)).await?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))?
    }

    /// Force a refresh after the API rejected `stale`
    pub async fn refresh_access_token(&self, stale: &str) -> AppResult<String> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.send(TokenCommand::RefreshAccessToken {
            stale: Some(stale.to_string()),
            respond: response_tx,
        })
        .await?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))?
    }

    /// Exchange an authorization code and store the resulting tokens
    pub async fn complete_oauth_exchange(&self, code: &str) -> AppResult<()> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.send(TokenCommand::CompleteExchange {
            code: code.to_string(),
            respond: response_tx,
        })
        .await?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))?
    }

    /// Whether an access token is currently held
    pub async fn has_access_token(&self) -> AppResult<bool> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.send(TokenCommand::HasAccessToken(response_tx)).await?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(TokenCommand::Shutdown).await;
        Ok(())
    }

    async fn send(&self, command: TokenCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| other_error(&format!("Actor mailbox error: {}", e)))
    }
}
