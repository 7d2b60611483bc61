//! Configuration types for the API client.

use crate::auth::{ApiKeyAuth, AuthMethod, KeyLocation};
use crate::errors::{ApiError, ApiErrorKind, ApiResult};
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = "universal-api-client/0.1.0";

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL.
    pub base_url: String,
    /// Authentication method.
    pub auth: Option<AuthMethod>,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::new(
                ApiErrorKind::InvalidBaseUrl,
                "Base URL cannot be empty",
            ));
        }

        let url = url::Url::parse(&self.base_url).map_err(|e| {
            ApiError::new(
                ApiErrorKind::InvalidBaseUrl,
                format!("Invalid base URL: {}", e),
            )
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ApiError::new(
                ApiErrorKind::InvalidBaseUrl,
                "Base URL must use http or https",
            ));
        }

        if let Some(auth) = &self.auth {
            auth.validate()?;
        }

        Ok(())
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads `API_BASE_URL`, then either `API_KEY` (with optional
    /// `API_KEY_NAME` and `API_KEY_LOCATION` = `header`|`query`) or the
    /// `TOKEN_URL`/`CLIENT_ID`/`CLIENT_SECRET` triple.
    pub fn from_env() -> ApiResult<Self> {
        let base_url = std::env::var("API_BASE_URL").map_err(|_| {
            ApiError::new(ApiErrorKind::InvalidBaseUrl, "API_BASE_URL not set")
        })?;

        let auth = if let Ok(key) = std::env::var("API_KEY") {
            let mut api_key = ApiKeyAuth::new(key);
            if let Ok(name) = std::env::var("API_KEY_NAME") {
                api_key = api_key.with_name(name);
            }
            match std::env::var("API_KEY_LOCATION").as_deref() {
                Ok("query") => api_key = api_key.with_location(KeyLocation::Query),
                Ok("header") | Err(_) => {}
                Ok(other) => {
                    return Err(ApiError::configuration(format!(
                        "Invalid API_KEY_LOCATION: {}",
                        other
                    )));
                }
            }
            AuthMethod::ApiKey(api_key)
        } else {
            let token_url = std::env::var("TOKEN_URL").map_err(|_| {
                ApiError::new(
                    ApiErrorKind::MissingAuth,
                    "Set API_KEY or TOKEN_URL/CLIENT_ID/CLIENT_SECRET",
                )
            })?;
            let client_id = std::env::var("CLIENT_ID")
                .map_err(|_| ApiError::new(ApiErrorKind::MissingAuth, "CLIENT_ID not set"))?;
            let client_secret = std::env::var("CLIENT_SECRET")
                .map_err(|_| ApiError::new(ApiErrorKind::MissingAuth, "CLIENT_SECRET not set"))?;
            AuthMethod::client_credentials(token_url, client_id, client_secret)
        };

        Self::builder().base_url(base_url).auth(auth).build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    auth: Option<AuthMethod>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the authentication method.
    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ApiResult<ClientConfig> {
        let config = ClientConfig {
            base_url: self.base_url.unwrap_or_default(),
            auth: self.auth,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        config.validate()?;
        Ok(config)
    }
}
