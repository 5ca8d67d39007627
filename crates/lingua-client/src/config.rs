//! Client configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default upper bound on one refresh exchange
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the waiter queue
pub const DEFAULT_MAX_WAITERS: usize = 256;

/// Default per-request HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and port of the API, without a trailing slash
    pub base_url: String,
    /// A refresh taking longer than this counts as failed
    pub refresh_timeout: Duration,
    /// Requests allowed to wait on one in-flight refresh
    pub max_waiters: usize,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            max_waiters: DEFAULT_MAX_WAITERS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with default bounds
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Load from the environment
    ///
    /// Reads `LINGUA_API_URL`, `CLIENT_REFRESH_TIMEOUT_MS`, `CLIENT_MAX_WAITERS`
    /// and `CLIENT_REQUEST_TIMEOUT_MS`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = env::var("LINGUA_API_URL").unwrap_or(defaults.base_url);
        let refresh_timeout = parse_var::<u64>("CLIENT_REFRESH_TIMEOUT_MS")?
            .map_or(defaults.refresh_timeout, Duration::from_millis);
        let max_waiters = parse_var::<usize>("CLIENT_MAX_WAITERS")?.unwrap_or(defaults.max_waiters);
        let request_timeout = parse_var::<u64>("CLIENT_REQUEST_TIMEOUT_MS")?
            .map_or(defaults.request_timeout, Duration::from_millis);

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            refresh_timeout,
            max_waiters,
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero bounds and non-HTTP base URLs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                var: "LINGUA_API_URL",
                message: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }
        if self.refresh_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                var: "CLIENT_REFRESH_TIMEOUT_MS",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.max_waiters == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CLIENT_MAX_WAITERS",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                var,
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
