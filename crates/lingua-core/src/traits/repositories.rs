//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{RevocationEntry, Subject};
use crate::error::DomainError;
use crate::value_objects::SubjectId;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Subject Repository
// ============================================================================

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// Find subject by ID
    async fn find_by_id(&self, id: SubjectId) -> RepoResult<Option<Subject>>;

    /// Find subject by (normalised) email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Subject>>;

    /// Check if email is already taken
    async fn email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Create a new subject; fails with `EmailAlreadyExists` on a duplicate email
    async fn create(&self, subject: &Subject, password_hash: &str) -> RepoResult<()>;

    /// Get password hash for authentication
    async fn get_password_hash(&self, id: SubjectId) -> RepoResult<Option<String>>;
}

// ============================================================================
// Revocation Registry
// ============================================================================

/// Shared store of retired refresh-credential identifiers.
///
/// Implementations must be consistent across every authority instance of a
/// deployment. `insert` is the linearization point for rotation: it must be an
/// atomic insert-if-absent, so two concurrent inserts of the same `token_id`
/// report `true` exactly once.
#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    /// Insert an entry; returns `false` if the identifier was already present
    async fn insert(&self, entry: &RevocationEntry) -> RepoResult<bool>;

    /// Whether the identifier is present
    async fn contains(&self, token_id: &str) -> RepoResult<bool>;

    /// Delete every entry whose `expires_at` is at or before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64>;
}
