//! End-to-end tests of the client refresh coordinator against a live server
//!
//! Run with: cargo test -p integration-tests --test client_refresh

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use integration_tests::{assert_error, assert_json, fixtures::*, TestServer};
use lingua_client::{ClientError, FileSessionStore, SessionEvent};
use lingua_service::SubjectResponse;
use reqwest::StatusCode;
use tokio::sync::broadcast::error::TryRecvError;

const ME: &str = "/api/v1/auth/me";

/// Access credentials issued by these servers live two seconds
const ACCESS_SECS: i64 = 2;

async fn wait_for_access_expiry() {
    tokio::time::sleep(Duration::from_millis(2100)).await;
}

async fn registered(server: &TestServer) -> RegisterBody {
    let body = RegisterBody::unique();
    let response = server.post("/api/v1/auth/register", &body).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_expired_access_refreshes_once_for_concurrent_requests() {
    let server = TestServer::start_with_access_expiry(ACCESS_SECS).await.unwrap();
    let account = registered(&server).await;

    let client = server.coordinator().unwrap();
    let mut events = client.subscribe();
    client.sign_in(&account.email, &account.password).await.unwrap();
    let first = client.session().unwrap();

    wait_for_access_expiry().await;

    let responses = join_all((0..5).map(|_| client.get(ME))).await;
    for response in responses {
        let response = response.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        let me: SubjectResponse = response.json().unwrap();
        assert_eq!(me.email, account.email);
    }

    // One rotation: one event, one retired value
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
    assert_eq!(events.try_recv().unwrap_err(), TryRecvError::Empty);
    assert_eq!(server.registry.len(), 1);

    let second = client.session().unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_eq!(second.subject, first.subject);

    // The first refresh value is spent
    let response = server
        .post("/api/v1/auth/refresh", &RefreshBody::new(&first.refresh_token))
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_revoked_session_forces_logout() {
    let server = TestServer::start_with_access_expiry(ACCESS_SECS).await.unwrap();
    let account = registered(&server).await;

    let client = server.coordinator().unwrap();
    let mut events = client.subscribe();
    client.sign_in(&account.email, &account.password).await.unwrap();

    // Retired elsewhere, e.g. a logout from another device
    let refresh_token = client.session().unwrap().refresh_token;
    server
        .post("/api/v1/auth/logout", &RefreshBody::new(refresh_token))
        .await
        .unwrap();

    wait_for_access_expiry().await;

    let results = join_all((0..3).map(|_| client.get(ME))).await;
    for result in results {
        assert_eq!(result.unwrap_err(), ClientError::AuthenticationFailed);
    }
    assert!(client.session().is_none());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::ForcedLogout);
}

#[tokio::test]
async fn test_non_401_errors_are_returned_untouched() {
    let server = TestServer::start().await.unwrap();
    let account = registered(&server).await;

    let client = server.coordinator().unwrap();
    client.sign_in(&account.email, &account.password).await.unwrap();

    let response = client.get("/api/v1/lessons").await.unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(client.session().is_some());
}

#[tokio::test]
async fn test_sign_in_rejected() {
    let server = TestServer::start().await.unwrap();
    let account = registered(&server).await;

    let client = server.coordinator().unwrap();
    let err = client.sign_in(&account.email, "Wrong-pass-1").await.unwrap_err();
    assert_eq!(err, ClientError::AuthenticationFailed);
    assert!(client.session().is_none());
}

#[tokio::test]
async fn test_sign_out_retires_refresh_value() {
    let server = TestServer::start().await.unwrap();
    let account = registered(&server).await;

    let client = server.coordinator().unwrap();
    client.sign_in(&account.email, &account.password).await.unwrap();
    let refresh_token = client.session().unwrap().refresh_token;

    client.sign_out().await.unwrap();
    assert!(client.session().is_none());

    let response = server
        .post("/api/v1/auth/refresh", &RefreshBody::new(refresh_token))
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_file_session_survives_restart() {
    let server = TestServer::start().await.unwrap();
    let account = registered(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let client = server
        .coordinator_with_store(Arc::new(FileSessionStore::new(&path)))
        .unwrap();
    let subject = client.sign_in(&account.email, &account.password).await.unwrap();
    drop(client);

    let restarted = server
        .coordinator_with_store(Arc::new(FileSessionStore::new(&path)))
        .unwrap();
    assert_eq!(restarted.restore().await.unwrap(), Some(subject));

    let response = restarted.get(ME).await.unwrap();
    let me: SubjectResponse = response.json().unwrap();
    assert_eq!(me.email, account.email);

    // Direct check against the API with the restored value
    let access = restarted.access_token().unwrap();
    let response = server.get_auth(ME, &access).await.unwrap();
    let _: SubjectResponse = assert_json(response, StatusCode::OK).await.unwrap();
}
