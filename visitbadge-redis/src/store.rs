//! Redis store implementation.

use async_trait::async_trait;
use redis::{Client, aio::ConnectionManager};
use smol_str::SmolStr;
use tokio::sync::OnceCell;
use tracing::{debug, trace};
use visitbadge_core::CacheKey;
use visitbadge_store::{CounterStore, StoreError, StoreResult};

use crate::error::Error;

/// Redis counter store based on the redis-rs crate.
///
/// Uses a [`ConnectionManager`] for asynchronous network interaction; the
/// manager reconnects on its own after a dropped connection.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    name: SmolStr,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("name", &self.name)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisStore {
    /// Creates a store for `redis://127.0.0.1/`.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Creates new RedisStore builder with default settings.
    #[must_use]
    pub fn builder() -> RedisStoreBuilder {
        RedisStoreBuilder::default()
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<&ConnectionManager, Error> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                debug!(store = %self.name, "Initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await?;
        Ok(manager)
    }

    async fn query_counter(&self, cmd: &redis::Cmd) -> Result<u64, Error> {
        let mut con = self.connection().await?.clone();
        let value: i64 = cmd.query_async(&mut con).await?;
        u64::try_from(value).map_err(|_| Error::NotACounter(value.to_string()))
    }
}

/// Part of builder pattern implementation for RedisStore.
pub struct RedisStoreBuilder {
    connection_info: String,
    name: SmolStr,
}

impl Default for RedisStoreBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            name: SmolStr::new_static("redis"),
        }
    }
}

impl RedisStoreBuilder {
    /// Set connection URL (`redis://[user:password@]host[:port][/db]`).
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Set a custom name for logs and metrics.
    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = name.into();
        self
    }

    /// Create new instance of the Redis store with passed settings.
    ///
    /// Only the URL is validated here; the connection opens on first use.
    pub fn build(self) -> Result<RedisStore, Error> {
        Ok(RedisStore {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
            name: self.name,
        })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn increment(&self, key: &CacheKey) -> StoreResult<u64> {
        let mut cmd = redis::cmd("INCR");
        cmd.arg(key.as_str());
        Ok(self.query_counter(&cmd).await?)
    }

    async fn get(&self, key: &CacheKey) -> StoreResult<u64> {
        let mut con = self.connection().await?.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        // GET on a missing key returns nil: the counter was never incremented.
        match value {
            None => Ok(0),
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| StoreError::from(Error::NotACounter(raw))),
        }
    }

    async fn add(&self, key: &CacheKey, delta: u64) -> StoreResult<u64> {
        let mut cmd = redis::cmd("INCRBY");
        cmd.arg(key.as_str()).arg(delta);
        Ok(self.query_counter(&cmd).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut con = self.connection().await?.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_invalid_url() {
        assert!(RedisStore::builder().server("not a url").build().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let store = RedisStore::new().unwrap();
        assert_eq!(store.name(), "redis");
        let renamed = RedisStore::builder().name("counts").build().unwrap();
        assert_eq!(renamed.name(), "counts");
    }
}
