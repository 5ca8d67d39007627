//! Credential authority
//!
//! Mints credential pairs, validates access credentials and rotates refresh
//! credentials against the revocation registry. Rotation is exclusive because
//! the registry insert is an atomic insert-if-absent: whichever caller creates
//! the entry for a refresh credential's identifier is the only one that gets a
//! new pair.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use lingua_common::{Claims, CredentialError, JwtService};
use lingua_core::{CredentialPair, RevocationEntry, RevocationReason, RevocationRegistry, Role, SubjectId};

use super::error::ServiceResult;

/// Issues and rotates credential pairs
#[derive(Clone)]
pub struct CredentialAuthority {
    jwt: Arc<JwtService>,
    registry: Arc<dyn RevocationRegistry>,
}

impl CredentialAuthority {
    pub fn new(jwt: Arc<JwtService>, registry: Arc<dyn RevocationRegistry>) -> Self {
        Self { jwt, registry }
    }

    /// The underlying codec
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// The registry retired refresh credentials are recorded in
    pub fn registry(&self) -> &dyn RevocationRegistry {
        self.registry.as_ref()
    }

    /// Issue a fresh pair for a subject
    #[instrument(skip(self))]
    pub fn issue(&self, subject_id: SubjectId, role: Role) -> ServiceResult<CredentialPair> {
        let pair = self.jwt.issue_pair(subject_id, role)?;
        debug!(subject_id = %subject_id, "Issued credential pair");
        Ok(pair)
    }

    /// Validate an access credential
    ///
    /// Has no side effects; the registry is not consulted.
    pub fn validate_access(&self, access_token: &str) -> ServiceResult<Claims> {
        Ok(self.jwt.validate_access_token(access_token)?)
    }

    /// Exchange a refresh credential for a new pair
    ///
    /// Fails with `Unknown` for values this authority did not issue, `Revoked`
    /// for retired values (including the loser of a concurrent rotation), and
    /// `Expired` once the refresh lifetime has passed.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<CredentialPair> {
        let claims = self
            .jwt
            .decode_refresh_token(refresh_token)
            .map_err(|_| CredentialError::Unknown)?;
        let subject_id = claims.subject_id().map_err(|_| CredentialError::Unknown)?;

        // Fast path only; the insert below decides
        if self.registry.contains(&claims.jti).await? {
            warn!(subject_id = %subject_id, token_id = %claims.jti, "Revoked refresh credential presented");
            return Err(CredentialError::Revoked.into());
        }

        if claims.is_expired() {
            debug!(subject_id = %subject_id, token_id = %claims.jti, "Expired refresh credential presented");
            return Err(CredentialError::Expired.into());
        }

        let entry = RevocationEntry::new(
            claims.jti.clone(),
            subject_id,
            RevocationReason::Rotated,
            claims.expires_at(),
        );
        if !self.registry.insert(&entry).await? {
            warn!(subject_id = %subject_id, token_id = %claims.jti, "Lost rotation race for refresh credential");
            return Err(CredentialError::Revoked.into());
        }

        let pair = self.jwt.issue_pair(subject_id, claims.role)?;
        info!(subject_id = %subject_id, token_id = %claims.jti, "Refresh credential rotated");
        Ok(pair)
    }

    /// Retire a refresh credential
    ///
    /// Idempotent. Values that cannot be decoded, and values already past
    /// expiry, have nothing to protect and succeed without a write.
    #[instrument(skip(self, refresh_token))]
    pub async fn revoke(&self, refresh_token: &str) -> ServiceResult<()> {
        let Ok(claims) = self.jwt.decode_refresh_token(refresh_token) else {
            debug!("Ignoring revoke of an undecodable credential");
            return Ok(());
        };
        let Ok(subject_id) = claims.subject_id() else {
            return Ok(());
        };
        if claims.is_expired() {
            return Ok(());
        }

        let entry = RevocationEntry::new(
            claims.jti.clone(),
            subject_id,
            RevocationReason::Logout,
            claims.expires_at(),
        );
        let inserted = self.registry.insert(&entry).await?;
        info!(subject_id = %subject_id, token_id = %claims.jti, newly = inserted, "Refresh credential revoked");
        Ok(())
    }

    /// Whether a refresh credential's identifier is in the registry
    ///
    /// Undecodable values report `false`.
    pub async fn is_revoked(&self, refresh_token: &str) -> ServiceResult<bool> {
        match self.jwt.decode_refresh_token(refresh_token) {
            Ok(claims) => Ok(self.registry.contains(&claims.jti).await?),
            Err(_) => Ok(false),
        }
    }

    /// Purge registry entries past their expiry
    #[instrument(skip(self))]
    pub async fn prune_expired(&self) -> ServiceResult<u64> {
        let pruned = self.registry.delete_expired(Utc::now()).await?;
        if pruned > 0 {
            info!(pruned, "Pruned expired revocation entries");
        }
        Ok(pruned)
    }
}

impl std::fmt::Debug for CredentialAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialAuthority")
            .field("jwt", &self.jwt)
            .finish_non_exhaustive()
    }
}
