//! sqlx error translation shared by the Postgres repositories

use lingua_core::DomainError;
use sqlx::Error as SqlxError;
use tracing::warn;

/// Translate any sqlx failure into a storage error
///
/// Pool exhaustion is logged separately since it usually means the pool is
/// undersized rather than that the database is down.
pub fn map_db_error(e: SqlxError) -> DomainError {
    if matches!(e, SqlxError::PoolTimedOut) {
        warn!("Timed out waiting for a database connection");
    }
    DomainError::DatabaseError(e.to_string())
}

/// Like [`map_db_error`], but a unique-constraint violation becomes `on_unique()`
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    let unique = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if unique {
        on_unique()
    } else {
        map_db_error(e)
    }
}
