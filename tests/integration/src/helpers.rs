//! Test helpers for integration tests
//!
//! Spawns the API on an ephemeral port over in-memory storage and provides
//! request and assertion helpers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use lingua_api::{create_app, server::build_authority, AppState};
use lingua_cache::MemoryRevocationRegistry;
use lingua_client::{ClientConfig, MemorySessionStore, RefreshCoordinator, SessionStore};
use lingua_common::{
    AppConfig, AppSettings, CorsConfig, DatabaseConfig, Environment, JwtConfig, RedisConfig,
    RegistryBackend, RegistryConfig, ServerConfig,
};
use lingua_service::ServiceContext;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::fixtures::MemorySubjectRepository;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub registry: MemoryRevocationRegistry,
    pub subjects: Arc<MemorySubjectRepository>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with default lifetimes
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config(900)).await
    }

    /// Start a test server whose access credentials live `seconds`
    pub async fn start_with_access_expiry(seconds: i64) -> Result<Self> {
        Self::start_with_config(test_config(seconds)).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let registry = MemoryRevocationRegistry::new();
        let subjects = Arc::new(MemorySubjectRepository::new());

        let authority = build_authority(&config, Arc::new(registry.clone()));
        let ctx = ServiceContext::new(subjects.clone(), authority);
        let app = create_app(AppState::new(ctx, config));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            registry,
            subjects,
            handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A coordinator pointed at this server
    pub fn coordinator(&self) -> Result<RefreshCoordinator> {
        self.coordinator_with_store(Arc::new(MemorySessionStore::new()))
    }

    pub fn coordinator_with_store(&self, store: Arc<dyn SessionStore>) -> Result<RefreshCoordinator> {
        Ok(RefreshCoordinator::http(&ClientConfig::new(self.base_url()), store)?)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a GET request with a bearer credential
    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).bearer_auth(token).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Configuration for an in-memory server
pub fn test_config(access_token_expiry: i64) -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "lingua-api-test".to_string(),
            env: Environment::Development,
        },
        api: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            issuer: "lingua".to_string(),
            access_token_expiry,
            refresh_token_expiry: 3600,
        },
        registry: RegistryConfig {
            backend: RegistryBackend::Memory,
            prune_interval_secs: 3600,
        },
        cors: CorsConfig {
            allowed_origins: Vec::new(),
        },
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}

/// Assert an error response and return its `error.code`
pub async fn assert_error(response: Response, expected_status: StatusCode) -> Result<String> {
    let body: serde_json::Value = assert_json(response, expected_status).await?;
    body["error"]["code"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Missing error code in {body}"))
}
