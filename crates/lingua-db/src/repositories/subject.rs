//! PostgreSQL implementation of SubjectRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use lingua_core::{DomainError, RepoResult, Subject, SubjectId, SubjectRepository};

use crate::models::SubjectModel;

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of SubjectRepository
#[derive(Clone)]
pub struct PgSubjectRepository {
    pool: PgPool,
}

impl PgSubjectRepository {
    /// Create a new PgSubjectRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectRepository for PgSubjectRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        let result = sqlx::query_as::<_, SubjectModel>(
            r"
            SELECT id, email, display_name, role, created_at, updated_at
            FROM subjects
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Subject::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Subject>> {
        let result = sqlx::query_as::<_, SubjectModel>(
            r"
            SELECT id, email, display_name, role, created_at, updated_at
            FROM subjects
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Subject::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM subjects WHERE email = $1)
            ",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, subject, password_hash), fields(subject_id = %subject.id))]
    async fn create(&self, subject: &Subject, password_hash: &str) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO subjects (id, email, display_name, role, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(subject.id.into_inner())
        .bind(&subject.email)
        .bind(&subject.display_name)
        .bind(subject.role.as_str())
        .bind(password_hash)
        .bind(subject.created_at)
        .bind(subject.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::EmailAlreadyExists))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_password_hash(&self, id: SubjectId) -> RepoResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r"
            SELECT password_hash FROM subjects WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }
}
