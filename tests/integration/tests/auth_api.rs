//! Auth API integration tests
//!
//! Run with: cargo test -p integration-tests --test auth_api

use integration_tests::{
    assert_error, assert_json, assert_status, fixtures::*, TestServer,
};
use lingua_core::CredentialPair;
use lingua_service::SubjectResponse;
use reqwest::StatusCode;

async fn register(server: &TestServer) -> (RegisterBody, CredentialPair) {
    let body = RegisterBody::unique();
    let response = server.post("/api/v1/auth/register", &body).await.unwrap();
    let pair = assert_json(response, StatusCode::CREATED).await.unwrap();
    (body, pair)
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server.get("/health/ready").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Registration and Login
// ============================================================================

#[tokio::test]
async fn test_register_then_me() {
    let server = TestServer::start().await.unwrap();
    let (body, pair) = register(&server).await;

    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, 900);
    assert_ne!(pair.access_token, pair.refresh_token);

    let response = server
        .get_auth("/api/v1/auth/me", &pair.access_token)
        .await
        .unwrap();
    let me: SubjectResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(me.email, body.email);
    assert_eq!(me.id, pair.subject_id);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let server = TestServer::start().await.unwrap();
    let (body, _) = register(&server).await;

    let response = server.post("/api/v1/auth/register", &body).await.unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(server.subjects.len(), 1);
}

#[tokio::test]
async fn test_register_weak_password() {
    let server = TestServer::start().await.unwrap();
    let mut body = RegisterBody::unique();
    body.password = "onlyletters".to_string();

    let response = server.post("/api/v1/auth/register", &body).await.unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "WEAK_PASSWORD");
    assert!(server.subjects.is_empty());
}

#[tokio::test]
async fn test_login() {
    let server = TestServer::start().await.unwrap();
    let (body, _) = register(&server).await;

    let response = server.post("/api/v1/auth/login", &body.login()).await.unwrap();
    let pair: CredentialPair = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!pair.access_token.is_empty());

    let mut wrong = body.login();
    wrong.password = "Wrong-pass-1".to_string();
    let response = server.post("/api/v1/auth/login", &wrong).await.unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_me_without_credential() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/api/v1/auth/me").await.unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "MISSING_AUTH");
}

// ============================================================================
// Refresh and Logout
// ============================================================================

#[tokio::test]
async fn test_refresh_rotates_once() {
    let server = TestServer::start().await.unwrap();
    let (_, first) = register(&server).await;

    let response = server
        .post("/api/v1/auth/refresh", &RefreshBody::new(&first.refresh_token))
        .await
        .unwrap();
    let second: CredentialPair = assert_json(response, StatusCode::OK).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_eq!(second.subject_id, first.subject_id);
    assert_eq!(second.role, first.role);

    // The rotated value is spent
    let response = server
        .post("/api/v1/auth/refresh", &RefreshBody::new(&first.refresh_token))
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "TOKEN_REVOKED");

    // Its successor is not
    let response = server
        .post("/api/v1/auth/refresh", &RefreshBody::new(&second.refresh_token))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
    assert_eq!(server.registry.len(), 2);
}

#[tokio::test]
async fn test_concurrent_refresh_of_one_value() {
    let server = TestServer::start().await.unwrap();
    let (_, pair) = register(&server).await;
    let body = RefreshBody::new(&pair.refresh_token);

    let (a, b) = tokio::join!(
        server.post("/api/v1/auth/refresh", &body),
        server.post("/api/v1/auth/refresh", &body),
    );
    let mut statuses = [a.unwrap().status(), b.unwrap().status()];
    statuses.sort();

    assert_eq!(statuses, [StatusCode::OK, StatusCode::UNAUTHORIZED]);
}

#[tokio::test]
async fn test_refresh_with_foreign_value() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .post("/api/v1/auth/refresh", &RefreshBody::new("eyJhbGciOiJIUzI1NiJ9.e30.c2ln"))
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "UNKNOWN_TOKEN");
}

#[tokio::test]
async fn test_refresh_with_access_value_is_unknown() {
    let server = TestServer::start().await.unwrap();
    let (_, pair) = register(&server).await;

    let response = server
        .post("/api/v1/auth/refresh", &RefreshBody::new(&pair.access_token))
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "UNKNOWN_TOKEN");
}

#[tokio::test]
async fn test_logout_revokes_refresh_value() {
    let server = TestServer::start().await.unwrap();
    let (_, pair) = register(&server).await;

    let response = server
        .post("/api/v1/auth/logout", &RefreshBody::new(&pair.refresh_token))
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server
        .post("/api/v1/auth/refresh", &RefreshBody::new(&pair.refresh_token))
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "TOKEN_REVOKED");

    // Unparseable values are accepted and ignored
    let response = server
        .post("/api/v1/auth/logout", &RefreshBody::new("garbage"))
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();
    assert_eq!(server.registry.len(), 1);
}
