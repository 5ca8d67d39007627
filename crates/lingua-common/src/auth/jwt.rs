//! JWT utilities for credential issuance
//!
//! Provides token encoding, decoding, and validation using the `jsonwebtoken` crate.
//! Expiry is checked here rather than by `jsonwebtoken` so that access and
//! refresh credentials share one definition of "expired" (`now >= exp`) and so
//! that a refresh credential past its expiry can still be identified.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lingua_core::{CredentialPair, Role, SubjectId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CredentialError;

const DEFAULT_ISSUER: &str = "lingua";

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (subject ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Role of the subject at issuance time
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique credential identifier, the key used by the revocation registry
    pub jti: String,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

impl Claims {
    /// Get the subject ID
    ///
    /// # Errors
    /// Returns `CredentialError::Invalid` if the subject is not a valid id
    pub fn subject_id(&self) -> Result<SubjectId, CredentialError> {
        SubjectId::parse(&self.sub).map_err(|_| CredentialError::Invalid)
    }

    /// Check if the token is expired at the given instant
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Check if the token is expired now
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry as a timestamp
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Check if this is an access token
    #[must_use]
    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access
    }

    /// Check if this is a refresh token
    #[must_use]
    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh
    }
}

/// JWT service for encoding and decoding credentials
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl JwtService {
    /// Create a new JWT service with the given secret and expiry times (seconds)
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64, refresh_token_expiry: i64) -> Self {
        Self::with_issuer(secret, DEFAULT_ISSUER, access_token_expiry, refresh_token_expiry)
    }

    /// Create a new JWT service with an explicit issuer
    #[must_use]
    pub fn with_issuer(
        secret: &str,
        issuer: &str,
        access_token_expiry: i64,
        refresh_token_expiry: i64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer: issuer.to_string(),
            access_token_expiry,
            refresh_token_expiry,
        }
    }

    /// Access credential lifetime in seconds
    #[must_use]
    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Refresh credential lifetime in seconds
    #[must_use]
    pub fn refresh_token_expiry(&self) -> i64 {
        self.refresh_token_expiry
    }

    /// Issue a credential pair for a subject
    ///
    /// Both halves share one issuance instant and carry distinct identifiers.
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_pair(
        &self,
        subject_id: SubjectId,
        role: Role,
    ) -> Result<CredentialPair, CredentialError> {
        let issued_at = Utc::now();
        let access_expires_at = issued_at + Duration::seconds(self.access_token_expiry);
        let refresh_expires_at = issued_at + Duration::seconds(self.refresh_token_expiry);

        let access_token =
            self.encode_token(subject_id, role, TokenType::Access, issued_at, access_expires_at)?;
        let refresh_token = self.encode_token(
            subject_id,
            role,
            TokenType::Refresh,
            issued_at,
            refresh_expires_at,
        )?;

        Ok(CredentialPair {
            access_token,
            refresh_token,
            token_type: CredentialPair::BEARER.to_string(),
            expires_in: self.access_token_expiry,
            subject_id,
            role,
            access_expires_at,
            refresh_expires_at,
            issued_at,
        })
    }

    /// Encode a JWT token
    fn encode_token(
        &self,
        subject_id: SubjectId,
        role: Role,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        let claims = Claims {
            sub: subject_id.to_string(),
            iss: self.issuer.clone(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CredentialError::Encoding(e.to_string()))
    }

    /// Verify a token's signature and issuer without checking expiry
    ///
    /// # Errors
    /// Returns `Malformed` if the value cannot be parsed, `Invalid` if it
    /// cannot be verified
    fn decode_verified(&self, token: &str) -> Result<Claims, CredentialError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate an access token and return the claims
    ///
    /// # Errors
    /// Returns an error if the token is malformed, invalid, expired, or not an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, CredentialError> {
        let claims = self.decode_verified(token)?;

        if !claims.is_access_token() {
            return Err(CredentialError::Invalid);
        }
        if claims.is_expired() {
            return Err(CredentialError::Expired);
        }

        Ok(claims)
    }

    /// Decode a refresh token without checking expiry
    ///
    /// The caller decides how to order the revocation and expiry checks.
    ///
    /// # Errors
    /// Returns an error if the token is malformed, invalid, or not a refresh token
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, CredentialError> {
        let claims = self.decode_verified(token)?;

        if !claims.is_refresh_token() {
            return Err(CredentialError::Invalid);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}
