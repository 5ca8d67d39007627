//! Service context - dependency container for services
//!
//! Holds the subject repository, the credential authority and the optional
//! infrastructure handles used by readiness probes.

use std::sync::Arc;

use lingua_cache::RedisPool;
use lingua_common::auth::PasswordService;
use lingua_core::SubjectRepository;
use lingua_db::PgPool;

use super::authority::CredentialAuthority;
use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// The pools are optional so the context can also run over in-memory
/// repositories; readiness only probes what is present.
#[derive(Clone)]
pub struct ServiceContext {
    pool: Option<PgPool>,
    redis_pool: Option<RedisPool>,
    subject_repo: Arc<dyn SubjectRepository>,
    authority: CredentialAuthority,
    password_service: PasswordService,
}

impl ServiceContext {
    /// Create a new service context
    pub fn new(subject_repo: Arc<dyn SubjectRepository>, authority: CredentialAuthority) -> Self {
        Self {
            pool: None,
            redis_pool: None,
            subject_repo,
            authority,
            password_service: PasswordService::new(),
        }
    }

    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Get the PostgreSQL connection pool, if configured
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Get the Redis connection pool, if configured
    pub fn redis_pool(&self) -> Option<&RedisPool> {
        self.redis_pool.as_ref()
    }

    /// Get the subject repository
    pub fn subject_repo(&self) -> &dyn SubjectRepository {
        self.subject_repo.as_ref()
    }

    /// Get the credential authority
    pub fn authority(&self) -> &CredentialAuthority {
        &self.authority
    }

    /// Get the password service
    pub fn password_service(&self) -> &PasswordService {
        &self.password_service
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("pool", &self.pool.as_ref().map(|_| "PgPool"))
            .field("redis_pool", &self.redis_pool)
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    pool: Option<PgPool>,
    redis_pool: Option<RedisPool>,
    subject_repo: Option<Arc<dyn SubjectRepository>>,
    authority: Option<CredentialAuthority>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn redis_pool(mut self, redis_pool: RedisPool) -> Self {
        self.redis_pool = Some(redis_pool);
        self
    }

    pub fn subject_repo(mut self, repo: Arc<dyn SubjectRepository>) -> Self {
        self.subject_repo = Some(repo);
        self
    }

    pub fn authority(mut self, authority: CredentialAuthority) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let subject_repo = self
            .subject_repo
            .ok_or_else(|| ServiceError::validation("subject_repo is required"))?;
        let authority = self
            .authority
            .ok_or_else(|| ServiceError::validation("authority is required"))?;

        let mut ctx = ServiceContext::new(subject_repo, authority);
        ctx.pool = self.pool;
        ctx.redis_pool = self.redis_pool;
        Ok(ctx)
    }
}
