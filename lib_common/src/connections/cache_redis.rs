//! # Redis Key-Value Implementation
//!
//! Provides an asynchronous wrapper for Redis key-value operations. The
//! underlying `ConnectionManager` reconnects on its own and is cheap to clone,
//! so concurrent writers each take their own handle.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use thiserror::Error;

/// Errors raised by [`CacheHandler`].
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid Redis URL: {0}")]
    InvalidUrl(#[source] RedisError),
    #[error("Redis command failed: {0}")]
    Command(#[from] RedisError),
}

/// A handler for Redis key-value interactions.
#[derive(Clone)]
pub struct CacheHandler {
    conn: ConnectionManager,
}

impl CacheHandler {
    /// Opens a managed connection from a connection string.
    ///
    /// # Arguments
    /// * `url` - The redis URL (e.g., "redis://127.0.0.1/").
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(CacheError::InvalidUrl)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::debug!("Redis connection manager ready");
        Ok(Self { conn })
    }

    /// Stores a string value under `key`, overwriting any previous value.
    pub async fn set_string(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }
}
