//! Request transport
//!
//! [`Transport`] executes one request with an optional bearer credential. The
//! coordinator only depends on the trait; [`HttpTransport`] is the reqwest
//! implementation.

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::TransportError;

/// A request to the API, kept whole so it can be replayed
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `/api/v1/auth/me`
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Set on the single reissue after a refresh; a replay is never refreshed again
    pub replayed: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            replayed: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body
    ///
    /// # Errors
    /// Returns `TransportError::Request` if the body cannot be serialized
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body).map_err(|e| TransportError::Request(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// The same request marked as a replay
    #[must_use]
    pub fn into_replay(mut self) -> Self {
        self.replayed = true;
        self
    }
}

/// Status and parsed JSON body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Option<serde_json::Value>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 401 is the only status that triggers a refresh
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// `error.code` from an error body
    pub fn error_code(&self) -> Option<&str> {
        self.body.as_ref()?.get("error")?.get("code")?.as_str()
    }

    /// Deserialize the body
    ///
    /// # Errors
    /// Returns `TransportError::Decode` if the body is absent or has another shape
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| TransportError::Decode("empty body".to_string()))?;
        serde_json::from_value(body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Executes API requests
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send `request`, adding `Authorization: Bearer` when `access_token` is set
    ///
    /// Error statuses are responses, not errors; only failing to exchange the
    /// request at all is a `TransportError`.
    async fn execute(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from client configuration
    ///
    /// # Errors
    /// Returns `TransportError::Request` if the HTTP client cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// JSON body of a response, if it has one
///
/// A body that is not JSON (a proxy's HTML error page, say) is dropped so the
/// status still reaches the caller.
fn decode_body(bytes: &[u8]) -> Option<serde_json::Value> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice(bytes)
        .inspect_err(|e| tracing::trace!(error = %e, len = bytes.len(), "Dropping non-JSON response body"))
        .ok()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if let Some(token) = access_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body = decode_body(&bytes);

        tracing::trace!(method = %request.method, path = %request.path, status = status.as_u16(), "API response");

        Ok(ApiResponse::new(status, body))
    }
}
