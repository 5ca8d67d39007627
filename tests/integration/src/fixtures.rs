//! Test fixtures and data generators

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lingua_core::{DomainError, RepoResult, Subject, SubjectId, SubjectRepository};
use parking_lot::RwLock;
use serde::Serialize;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

pub const TEST_PASSWORD: &str = "Grammar-42";

/// Registration request
#[derive(Debug, Clone, Serialize)]
pub struct RegisterBody {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

impl RegisterBody {
    pub fn unique() -> Self {
        let suffix = unique_suffix();
        Self {
            email: format!("learner{suffix}@example.com"),
            display_name: format!("Learner {suffix}"),
            password: TEST_PASSWORD.to_string(),
        }
    }

    pub fn login(&self) -> LoginBody {
        LoginBody {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

/// Login request
#[derive(Debug, Clone, Serialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Refresh or logout request
#[derive(Debug, Clone, Serialize)]
pub struct RefreshBody {
    pub refresh_token: String,
}

impl RefreshBody {
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
        }
    }
}

/// Subject repository kept in process memory
#[derive(Debug, Default)]
pub struct MemorySubjectRepository {
    rows: RwLock<HashMap<SubjectId, (Subject, String)>>,
}

impl MemorySubjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl SubjectRepository for MemorySubjectRepository {
    async fn find_by_id(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        Ok(self.rows.read().get(&id).map(|(s, _)| s.clone()))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Subject>> {
        Ok(self
            .rows
            .read()
            .values()
            .find(|(s, _)| s.email == email)
            .map(|(s, _)| s.clone()))
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        Ok(self.rows.read().values().any(|(s, _)| s.email == email))
    }

    async fn create(&self, subject: &Subject, password_hash: &str) -> RepoResult<()> {
        let mut rows = self.rows.write();
        if rows.values().any(|(s, _)| s.email == subject.email) {
            return Err(DomainError::EmailAlreadyExists);
        }
        rows.insert(subject.id, (subject.clone(), password_hash.to_string()));
        Ok(())
    }

    async fn get_password_hash(&self, id: SubjectId) -> RepoResult<Option<String>> {
        Ok(self.rows.read().get(&id).map(|(_, h)| h.clone()))
    }
}
