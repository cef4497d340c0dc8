//! Redis-backed shared cache tier.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use redis::aio::MultiplexedConnection;
use redis::{Client as RedisClient, RedisError};

use super::shared::SharedCache;
use crate::errors::{CacheError, Error, Result};

impl From<RedisError> for Error {
    fn from(err: RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout() {
            Error::Cache(CacheError::Unavailable(err.to_string()))
        } else {
            Error::Cache(CacheError::CommandFailed(err.to_string()))
        }
    }
}

/// Shared cache on a Redis server.
///
/// Holds one multiplexed connection, which is cheap to clone per command and
/// reconnects on its own.
#[derive(Clone)]
pub struct RedisSharedCache {
    connection: MultiplexedConnection,
}

impl RedisSharedCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = RedisClient::open(redis_url).map_err(|e| {
            CacheError::Unavailable(format!("Invalid Redis URL '{}': {}", redis_url, e))
        })?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(format!("Failed to connect to Redis: {}", e)))?;

        debug!("Connected to Redis at: {}", redis_url);

        Ok(Self { connection })
    }
}

/// Redis rejects `EX 0`; sub-second TTLs round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl SharedCache for RedisSharedCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        let count: i64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count > 0)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}
