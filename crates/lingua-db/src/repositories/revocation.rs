//! PostgreSQL implementation of RevocationRegistry
//!
//! The `token_id` primary key is what makes rotation exclusive: of any number
//! of concurrent inserts for one identifier, exactly one affects a row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use lingua_core::{RepoResult, RevocationEntry, RevocationRegistry};

use super::error::map_db_error;

/// PostgreSQL implementation of RevocationRegistry
#[derive(Clone)]
pub struct PgRevocationRegistry {
    pool: PgPool,
}

impl PgRevocationRegistry {
    /// Create a new PgRevocationRegistry
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationRegistry for PgRevocationRegistry {
    #[instrument(skip(self, entry), fields(token_id = %entry.token_id, reason = %entry.reason))]
    async fn insert(&self, entry: &RevocationEntry) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO revoked_refresh_tokens (token_id, subject_id, reason, revoked_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (token_id) DO NOTHING
            ",
        )
        .bind(&entry.token_id)
        .bind(entry.subject_id.into_inner())
        .bind(entry.reason.as_str())
        .bind(entry.revoked_at)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn contains(&self, token_id: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM revoked_refresh_tokens WHERE token_id = $1)
            ",
        )
        .bind(token_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM revoked_refresh_tokens
            WHERE expires_at <= $1
            ",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        debug!(pruned = result.rows_affected(), "Pruned revocation entries");
        Ok(result.rows_affected())
    }
}
