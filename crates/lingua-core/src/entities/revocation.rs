//! Revocation entry - a retired refresh credential that must never be exchanged again

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::SubjectId;

/// Why a refresh credential was retired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Consumed by a successful refresh
    Rotated,
    /// Explicitly revoked at logout
    Logout,
}

impl RevocationReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rotated => "rotated",
            Self::Logout => "logout",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry entry keyed by the refresh credential's identifier (its `jti`),
/// never by the raw credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEntry {
    pub token_id: String,
    pub subject_id: SubjectId,
    pub reason: RevocationReason,
    pub revoked_at: DateTime<Utc>,
    /// Natural expiry of the revoked credential; the entry is dead afterwards
    pub expires_at: DateTime<Utc>,
}

impl RevocationEntry {
    /// Create a new entry revoked now
    pub fn new(
        token_id: impl Into<String>,
        subject_id: SubjectId,
        reason: RevocationReason,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token_id: token_id.into(),
            subject_id,
            reason,
            revoked_at: Utc::now(),
            expires_at,
        }
    }

    /// Whether the entry is past its expiry and may be purged
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
