//! Pooled Redis connections backed by deadpool-redis.

use deadpool_redis::{Config, Connection, Pool, Runtime};
use lingua_common::RedisConfig;

/// Connection settings for [`RedisPool`]
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    pub url: String,
    pub max_connections: usize,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
        }
    }
}

impl From<&RedisConfig> for RedisPoolConfig {
    fn from(config: &RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections as usize,
        }
    }
}

/// Failures raised while talking to Redis
#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Invalid Redis pool settings: {0}")]
    Build(String),

    #[error("No Redis connection available: {0}")]
    Checkout(#[from] deadpool_redis::PoolError),

    #[error("Redis command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("Stored value could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Host part of a Redis URL, without any `user:password@` prefix
fn redacted_host(url: &str) -> &str {
    url.rsplit_once('@').map_or(url, |(_, host)| host)
}

/// Shared Redis connection pool
///
/// Connections are opened lazily, so building a pool never touches the
/// network. Use [`RedisPool::health_check`] to verify reachability.
#[derive(Clone)]
pub struct RedisPool {
    inner: Pool,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.inner.status();
        f.debug_struct("RedisPool")
            .field("size", &status.size)
            .field("available", &status.available)
            .field("max_size", &status.max_size)
            .finish()
    }
}

impl RedisPool {
    /// Build a pool from explicit settings
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let builder = Config::from_url(&config.url)
            .builder()
            .map_err(|e| RedisPoolError::Build(e.to_string()))?;
        let inner = builder
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::Build(e.to_string()))?;

        tracing::info!(
            host = %redacted_host(&config.url),
            max_connections = config.max_connections,
            "Redis pool ready"
        );

        Ok(Self { inner })
    }

    /// Build a pool from the application's `redis` section
    pub fn from_config(config: &RedisConfig) -> RedisResult<Self> {
        Self::new(RedisPoolConfig::from(config))
    }

    /// Check out a connection
    pub async fn get(&self) -> RedisResult<Connection> {
        Ok(self.inner.get().await?)
    }

    /// Round-trip a `PING`
    pub async fn health_check(&self) -> RedisResult<()> {
        let mut conn = self.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
