//! Exchanges with the credential authority

use std::sync::Arc;

use async_trait::async_trait;
use lingua_core::CredentialPair;
use serde_json::json;

use crate::error::ExchangeError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/v1/auth/logout";

/// Login, refresh and logout against the authority
#[async_trait]
pub trait CredentialExchange: Send + Sync + 'static {
    async fn login(&self, email: &str, password: &str) -> Result<CredentialPair, ExchangeError>;

    /// Rotate `refresh_token`; the presented value is retired on success
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, ExchangeError>;

    async fn logout(&self, refresh_token: &str) -> Result<(), ExchangeError>;
}

/// [`CredentialExchange`] over the HTTP API
#[derive(Clone)]
pub struct HttpAuthority {
    transport: Arc<dyn Transport>,
}

impl HttpAuthority {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn exchange(&self, request: ApiRequest) -> Result<ApiResponse, ExchangeError> {
        let response = self.transport.execute(&request, None).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(rejected(&response))
        }
    }

    async fn exchange_pair(&self, request: ApiRequest) -> Result<CredentialPair, ExchangeError> {
        Ok(self.exchange(request).await?.json::<CredentialPair>()?)
    }
}

fn rejected(response: &ApiResponse) -> ExchangeError {
    ExchangeError::Rejected {
        status: response.status.as_u16(),
        code: response.error_code().unwrap_or("UNKNOWN").to_string(),
    }
}

#[async_trait]
impl CredentialExchange for HttpAuthority {
    async fn login(&self, email: &str, password: &str) -> Result<CredentialPair, ExchangeError> {
        let request = ApiRequest::post(LOGIN_PATH).json(&json!({
            "email": email,
            "password": password,
        }))?;
        self.exchange_pair(request).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, ExchangeError> {
        let request = ApiRequest::post(REFRESH_PATH).json(&json!({ "refresh_token": refresh_token }))?;
        self.exchange_pair(request).await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), ExchangeError> {
        let request = ApiRequest::post(LOGOUT_PATH).json(&json!({ "refresh_token": refresh_token }))?;
        self.exchange(request).await.map(|_| ())
    }
}

impl std::fmt::Debug for HttpAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthority").finish_non_exhaustive()
    }
}
