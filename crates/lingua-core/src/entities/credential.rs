//! Credential pair - a short-lived access credential and its rotating refresh credential

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Role, SubjectId};

/// Access/refresh credential pair issued to a subject
///
/// This is also the wire format returned by the login, register and refresh
/// endpoints, so both halves of the system share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Lifetime of the access credential in seconds
    pub expires_in: i64,
    pub subject_id: SubjectId,
    pub role: Role,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
}

impl CredentialPair {
    /// Token type advertised for bearer credentials
    pub const BEARER: &'static str = "Bearer";

    /// Whether the access half is past its expiry at `now`
    pub fn access_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.access_expires_at
    }

    /// Whether the refresh half is past its expiry at `now`
    pub fn refresh_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(now: DateTime<Utc>) -> CredentialPair {
        CredentialPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            token_type: CredentialPair::BEARER.to_string(),
            expires_in: 900,
            subject_id: SubjectId::nil(),
            role: Role::Editor,
            access_expires_at: now + Duration::minutes(15),
            refresh_expires_at: now + Duration::days(30),
            issued_at: now,
        }
    }

    #[test]
    fn test_expiry_checks() {
        let now = Utc::now();
        let pair = sample(now);

        assert!(!pair.access_expired_at(now));
        assert!(pair.access_expired_at(now + Duration::minutes(16)));
        assert!(!pair.refresh_expired_at(now + Duration::days(29)));
        assert!(pair.refresh_expired_at(now + Duration::days(30)));
    }

    #[test]
    fn test_wire_format() {
        let pair = sample(Utc::now());
        let json = serde_json::to_value(&pair).unwrap();

        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["role"], "editor");
        assert_eq!(json["expires_in"], 900);
    }
}
