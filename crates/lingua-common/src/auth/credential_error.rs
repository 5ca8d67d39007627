//! Credential failure taxonomy
//!
//! `Expired` is recoverable by a refresh. `Unknown` and `Revoked` are trust
//! failures that force re-authentication. `Malformed` is treated like
//! `Invalid` and is never retryable.

/// Why a presented credential was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential expired")]
    Expired,

    #[error("Credential is malformed")]
    Malformed,

    #[error("Credential is invalid")]
    Invalid,

    #[error("Credential was not issued by this authority")]
    Unknown,

    #[error("Credential has been revoked")]
    Revoked,

    #[error("Failed to encode credential: {0}")]
    Encoding(String),
}

impl CredentialError {
    /// Whether a refresh can recover from this failure
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Stable error code for API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Expired => "TOKEN_EXPIRED",
            Self::Malformed => "MALFORMED_TOKEN",
            Self::Invalid => "INVALID_TOKEN",
            Self::Unknown => "UNKNOWN_TOKEN",
            Self::Revoked => "TOKEN_REVOKED",
            Self::Encoding(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed,
            _ => Self::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_expired_is_recoverable() {
        assert!(CredentialError::Expired.is_recoverable());
        assert!(!CredentialError::Revoked.is_recoverable());
        assert!(!CredentialError::Unknown.is_recoverable());
        assert!(!CredentialError::Malformed.is_recoverable());
    }

    #[test]
    fn test_codes() {
        assert_eq!(CredentialError::Expired.code(), "TOKEN_EXPIRED");
        assert_eq!(CredentialError::Revoked.code(), "TOKEN_REVOKED");
        assert_eq!(CredentialError::Unknown.code(), "UNKNOWN_TOKEN");
    }

    #[test]
    fn test_from_jsonwebtoken_kinds() {
        use jsonwebtoken::errors::{Error, ErrorKind};

        assert_eq!(
            CredentialError::from(Error::from(ErrorKind::ExpiredSignature)),
            CredentialError::Expired
        );
        assert_eq!(
            CredentialError::from(Error::from(ErrorKind::InvalidToken)),
            CredentialError::Malformed
        );
        assert_eq!(
            CredentialError::from(Error::from(ErrorKind::InvalidSignature)),
            CredentialError::Invalid
        );
    }
}
