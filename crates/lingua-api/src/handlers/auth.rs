//! Authentication handlers
//!
//! Endpoints for registration, login, credential refresh, logout and `me`.

use axum::{extract::State, Json};
use lingua_core::CredentialPair;
use lingua_service::{
    AuthService, LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest,
    SubjectResponse,
};

use crate::extractors::{AuthSubject, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Register a new learner
///
/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Created<Json<CredentialPair>>> {
    let pair = AuthService::new(state.service_context())
        .register(request)
        .await?;
    Ok(Created(Json(pair)))
}

/// Login with email and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<CredentialPair>> {
    let pair = AuthService::new(state.service_context()).login(request).await?;
    Ok(Json(pair))
}

/// Rotate a refresh credential
///
/// POST /auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<Json<CredentialPair>> {
    let pair = AuthService::new(state.service_context())
        .refresh(request)
        .await?;
    Ok(Json(pair))
}

/// Retire a refresh credential
///
/// POST /auth/logout
///
/// Responds 204 whatever the body holds.
pub async fn logout(
    State(state): State<AppState>,
    body: Option<Json<LogoutRequest>>,
) -> NoContent {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    AuthService::new(state.service_context()).logout(request).await;
    NoContent
}

/// The authenticated subject
///
/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthSubject,
) -> ApiResult<Json<SubjectResponse>> {
    let subject = AuthService::new(state.service_context())
        .me(auth.subject_id)
        .await?;
    Ok(Json(subject))
}
