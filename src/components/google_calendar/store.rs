use crate::config::TokenStorage;
use crate::error::AppResult;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

/// Persistence for the refresh token
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Load the stored refresh token, `None` when there is nothing usable
    async fn load(&self) -> AppResult<Option<String>>;

    /// Replace the stored refresh token
    async fn save(&mut self, refresh_token: &str) -> AppResult<()>;
}

/// Build the store selected by configuration
pub fn store_for(storage: &TokenStorage) -> Box<dyn RefreshTokenStore> {
    match storage {
        TokenStorage::File(path) => Box::new(FileTokenStore::new(path.clone())),
        TokenStorage::Memory => Box::new(MemoryTokenStore::default()),
    }
}

/// Plaintext file holding just the token
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RefreshTokenStore for FileTokenStore {
    async fn load(&self) -> AppResult<Option<String>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Refresh token file {:?} not found", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let token = content.trim();
        if token.is_empty() {
            warn!("Refresh token file {:?} is empty", self.path);
            return Ok(None);
        }

        Ok(Some(token.to_string()))
    }

    async fn save(&mut self, refresh_token: &str) -> AppResult<()> {
        fs::write(&self.path, refresh_token).await?;
        info!("Refresh token saved to {:?}", self.path);
        Ok(())
    }
}

/// Keeps the token for the lifetime of the process only
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

#[async_trait]
impl RefreshTokenStore for MemoryTokenStore {
    async fn load(&self) -> AppResult<Option<String>> {
        Ok(self.token.clone())
    }

    async fn save(&mut self, refresh_token: &str) -> AppResult<()> {
        self.token = Some(refresh_token.to_string());
        info!("Refresh token kept in memory");
        Ok(())
    }
}
