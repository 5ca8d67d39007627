//! Subject entity - an account that can authenticate against the platform

use chrono::{DateTime, Utc};

use crate::value_objects::{Role, SubjectId};

/// Subject entity representing a platform account (learner, editor or admin)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: SubjectId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subject {
    /// Create a new Subject with a freshly generated id
    pub fn new(email: String, display_name: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: SubjectId::generate(),
            email,
            display_name,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Normalise an email address for lookups and uniqueness checks
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}
