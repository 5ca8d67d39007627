//! Authentication service
//!
//! Handles registration, login, credential refresh, logout and `me`.

use lingua_common::AppError;
use lingua_core::{CredentialPair, Role, Subject, SubjectId};
use tracing::{info, instrument, warn};

use crate::dto::{LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest, SubjectResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a new learner account and sign it in
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<CredentialPair> {
        let email = Subject::normalize_email(&request.email);

        let password_hash = self.ctx.password_service().hash_new(&request.password)?;

        if self.ctx.subject_repo().email_exists(&email).await? {
            return Err(ServiceError::conflict("Email already registered"));
        }

        let subject = Subject::new(email, request.display_name.trim().to_string(), Role::Learner);
        self.ctx.subject_repo().create(&subject, &password_hash).await?;

        info!(subject_id = %subject.id, "Subject registered");

        self.ctx.authority().issue(subject.id, subject.role)
    }

    /// Login with email and password
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<CredentialPair> {
        let email = Subject::normalize_email(&request.email);

        let subject = self
            .ctx
            .subject_repo()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| {
                warn!("Login failed: unknown email");
                ServiceError::App(AppError::InvalidCredentials)
            })?;

        let password_hash = self
            .ctx
            .subject_repo()
            .get_password_hash(subject.id)
            .await?
            .ok_or_else(|| {
                warn!(subject_id = %subject.id, "Login failed: no password hash");
                ServiceError::App(AppError::InvalidCredentials)
            })?;

        self.ctx
            .password_service()
            .verify_or_error(&request.password, &password_hash)
            .inspect_err(|_| warn!(subject_id = %subject.id, "Login failed: invalid password"))?;

        info!(subject_id = %subject.id, "Subject logged in");

        self.ctx.authority().issue(subject.id, subject.role)
    }

    /// Exchange a refresh credential for a new pair
    #[instrument(skip(self, request))]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<CredentialPair> {
        self.ctx.authority().refresh(&request.refresh_token).await
    }

    /// Retire the presented refresh credential
    ///
    /// Always succeeds from the caller's point of view; a registry failure is
    /// logged, and the credential stays usable until it expires.
    #[instrument(skip(self, request))]
    pub async fn logout(&self, request: LogoutRequest) {
        if request.refresh_token.is_empty() {
            return;
        }

        if let Err(e) = self.ctx.authority().revoke(&request.refresh_token).await {
            warn!(error = %e, "Failed to record logout revocation");
        }
    }

    /// Load the subject an access credential was issued to
    #[instrument(skip(self))]
    pub async fn me(&self, subject_id: SubjectId) -> ServiceResult<SubjectResponse> {
        self.ctx
            .subject_repo()
            .find_by_id(subject_id)
            .await?
            .map(SubjectResponse::from)
            .ok_or_else(|| ServiceError::not_found("Subject", subject_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use lingua_cache::MemoryRevocationRegistry;
    use lingua_common::{CredentialError, JwtService};
    use lingua_core::{DomainError, RepoResult, SubjectRepository};

    use crate::services::CredentialAuthority;

    #[derive(Default)]
    struct MockSubjects {
        rows: Mutex<HashMap<SubjectId, (Subject, String)>>,
    }

    #[async_trait]
    impl SubjectRepository for MockSubjects {
        async fn find_by_id(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
            Ok(self.rows.lock().unwrap().get(&id).map(|(s, _)| s.clone()))
        }

        async fn find_by_email(&self, email: &str) -> RepoResult<Option<Subject>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|(s, _)| s.email == email)
                .map(|(s, _)| s.clone()))
        }

        async fn email_exists(&self, email: &str) -> RepoResult<bool> {
            Ok(self.find_by_email(email).await?.is_some())
        }

        async fn create(&self, subject: &Subject, password_hash: &str) -> RepoResult<()> {
            let mut rows = self.rows.lock().unwrap();
            if rows.values().any(|(s, _)| s.email == subject.email) {
                return Err(DomainError::EmailAlreadyExists);
            }
            rows.insert(subject.id, (subject.clone(), password_hash.to_string()));
            Ok(())
        }

        async fn get_password_hash(&self, id: SubjectId) -> RepoResult<Option<String>> {
            Ok(self.rows.lock().unwrap().get(&id).map(|(_, h)| h.clone()))
        }
    }

    fn context() -> ServiceContext {
        let authority = CredentialAuthority::new(
            Arc::new(JwtService::new("auth-service-test-secret-0123456789", 900, 3600)),
            Arc::new(MemoryRevocationRegistry::new()),
        );
        ServiceContext::builder()
            .subject_repo(Arc::new(MockSubjects::default()))
            .authority(authority)
            .build()
            .unwrap()
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            display_name: " Ana ".to_string(),
            password: "Grammar-42".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_me() {
        let ctx = context();
        let auth = AuthService::new(&ctx);

        let pair = auth.register(register_request("Ana@Example.com")).await.unwrap();
        assert_eq!(pair.role, Role::Learner);

        let claims = ctx.authority().validate_access(&pair.access_token).unwrap();
        let me = auth.me(claims.subject_id().unwrap()).await.unwrap();
        assert_eq!(me.email, "ana@example.com");
        assert_eq!(me.display_name, "Ana");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let ctx = context();
        let auth = AuthService::new(&ctx);

        auth.register(register_request("ana@example.com")).await.unwrap();
        let err = auth
            .register(register_request("ANA@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let ctx = context();
        let auth = AuthService::new(&ctx);

        let mut request = register_request("ana@example.com");
        request.password = "passwordonly".to_string();

        let err = auth.register(request).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "WEAK_PASSWORD");
    }

    #[tokio::test]
    async fn test_login() {
        let ctx = context();
        let auth = AuthService::new(&ctx);
        auth.register(register_request("ana@example.com")).await.unwrap();

        let pair = auth
            .login(LoginRequest {
                email: "ana@example.com".to_string(),
                password: "Grammar-42".to_string(),
            })
            .await
            .unwrap();
        assert!(ctx.authority().validate_access(&pair.access_token).is_ok());

        for (email, password) in [("ana@example.com", "wrong-pass-1"), ("bob@example.com", "Grammar-42")] {
            let err = auth
                .login(LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await
                .unwrap_err();
            assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
        }
    }

    #[tokio::test]
    async fn test_refresh_then_logout() {
        let ctx = context();
        let auth = AuthService::new(&ctx);
        let first = auth.register(register_request("ana@example.com")).await.unwrap();

        let second = auth
            .refresh(RefreshTokenRequest {
                refresh_token: first.refresh_token.clone(),
            })
            .await
            .unwrap();

        auth.logout(LogoutRequest {
            refresh_token: second.refresh_token.clone(),
        })
        .await;
        auth.logout(LogoutRequest::default()).await;

        let err = auth
            .refresh(RefreshTokenRequest {
                refresh_token: second.refresh_token,
            })
            .await
            .unwrap_err();
        assert_eq!(err.as_credential(), Some(&CredentialError::Revoked));
    }

    #[tokio::test]
    async fn test_me_unknown_subject() {
        let ctx = context();
        let err = AuthService::new(&ctx)
            .me(SubjectId::generate())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
