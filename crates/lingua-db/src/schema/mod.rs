//! Embedded schema
//!
//! Every statement is idempotent, so the schema is applied on each start.

use sqlx::PgPool;
use tracing::info;

/// DDL for the subjects and revoked_refresh_tokens tables
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Create missing tables and indexes
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    info!("Database schema ensured");
    Ok(())
}
