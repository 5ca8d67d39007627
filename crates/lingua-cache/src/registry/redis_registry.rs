//! Redis-backed revocation registry.
//!
//! Each entry is one key written with `SET NX EXAT`. The NX flag makes the
//! insert exclusive across every authority instance sharing the Redis, and
//! the EXAT expiry removes the key once the revoked credential would have
//! expired anyway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, ExistenceCheck, SetExpiry, SetOptions};
use tracing::{debug, instrument};

use lingua_core::{DomainError, RepoResult, RevocationEntry, RevocationRegistry};

use crate::pool::{RedisPool, RedisPoolError};

/// Key prefix for revoked refresh credential identifiers
pub const REVOCATION_KEY_PREFIX: &str = "revoked_refresh:";

fn map_redis_error(e: RedisPoolError) -> DomainError {
    DomainError::CacheError(e.to_string())
}

/// Revocation registry storing entries as expiring Redis keys
#[derive(Clone, Debug)]
pub struct RedisRevocationRegistry {
    pool: RedisPool,
}

impl RedisRevocationRegistry {
    /// Create a new registry over the given pool
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Generate Redis key for an identifier
    fn key(token_id: &str) -> String {
        format!("{REVOCATION_KEY_PREFIX}{token_id}")
    }

    /// Expiry timestamp for an entry, at least one second in the future
    fn expiry_timestamp(entry: &RevocationEntry, now: DateTime<Utc>) -> u64 {
        let floor = now.timestamp() + 1;
        entry.expires_at.timestamp().max(floor) as u64
    }
}

#[async_trait]
impl RevocationRegistry for RedisRevocationRegistry {
    #[instrument(skip(self, entry), fields(token_id = %entry.token_id, reason = %entry.reason))]
    async fn insert(&self, entry: &RevocationEntry) -> RepoResult<bool> {
        let expires_at = Self::expiry_timestamp(entry, Utc::now());
        let value = serde_json::to_string(entry).map_err(|e| map_redis_error(e.into()))?;
        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EXAT(expires_at));

        let mut conn = self.pool.get().await.map_err(map_redis_error)?;
        // NX replies nil when the key already exists
        let reply: Option<String> = conn
            .set_options(Self::key(&entry.token_id), value, options)
            .await
            .map_err(|e| map_redis_error(e.into()))?;
        Ok(reply.is_some())
    }

    #[instrument(skip(self))]
    async fn contains(&self, token_id: &str) -> RepoResult<bool> {
        let mut conn = self.pool.get().await.map_err(map_redis_error)?;
        conn.exists(Self::key(token_id))
            .await
            .map_err(|e| map_redis_error(e.into()))
    }

    async fn delete_expired(&self, _now: DateTime<Utc>) -> RepoResult<u64> {
        // Keys carry their own expiry
        debug!("Redis registry prunes through key expiry");
        Ok(0)
    }
}
