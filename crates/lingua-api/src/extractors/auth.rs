//! Authentication extractor
//!
//! Extracts and validates the access credential from the Authorization header.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use lingua_core::{Role, SubjectId};
use lingua_service::ServiceError;

use crate::response::ApiError;
use crate::state::AppState;

/// Subject authenticated by a valid access credential
///
/// Rejects with 401: `MISSING_AUTH` without a bearer header, `TOKEN_EXPIRED`
/// for an expired access value (the client's cue to refresh) and
/// `INVALID_TOKEN` / `MALFORMED_TOKEN` otherwise.
#[derive(Debug, Clone)]
pub struct AuthSubject {
    pub subject_id: SubjectId,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSubject
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        let app_state = AppState::from_ref(state);

        let claims = app_state
            .authority()
            .validate_access(bearer.token())
            .inspect_err(|e| tracing::debug!(error = %e, "Rejected access credential"))?;

        let subject_id = claims.subject_id().map_err(ServiceError::from)?;

        Ok(Self {
            subject_id,
            role: claims.role,
        })
    }
}
