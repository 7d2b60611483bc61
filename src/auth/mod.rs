//! Authentication schemes applied to outgoing requests.
//!
//! Exactly one [`AuthMethod`] variant is active per client instance,
//! selected at construction. [`AuthManager`] owns the cached OAuth2 token;
//! nothing else reads or writes it.

use crate::errors::{ApiError, ApiErrorKind, ApiResult};
use crate::transport::{HttpRequest, HttpTransport};
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default header/query parameter name for API-key authentication.
pub const DEFAULT_KEY_NAME: &str = "x-api-key";

/// Buffer before expiry within which a cached token is refreshed early.
const REFRESH_BUFFER_SECS: i64 = 300;

/// Where an API key is placed on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLocation {
    /// Sent as a request header.
    Header,
    /// Sent as a query parameter.
    Query,
}

/// API-key authentication configuration.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    /// The API key.
    pub key: SecretString,
    /// Key placement.
    pub location: KeyLocation,
    /// Header name or query parameter name for the key.
    pub name: String,
    /// Additional headers sent with every request.
    pub extra_headers: HashMap<String, String>,
}

impl ApiKeyAuth {
    /// Creates a header-based API key with the default name.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::new(key.into()),
            location: KeyLocation::Header,
            name: DEFAULT_KEY_NAME.to_string(),
            extra_headers: HashMap::new(),
        }
    }

    /// Sets the key placement.
    pub fn with_location(mut self, location: KeyLocation) -> Self {
        self.location = location;
        self
    }

    /// Sets the header or query parameter name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a header sent with every request. The key header wins if a
    /// collision occurs at decoration time.
    pub fn with_extra_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }
}

/// OAuth2 client-credentials authentication configuration.
#[derive(Debug, Clone)]
pub struct ClientCredentialsAuth {
    /// Token endpoint URL.
    pub token_url: String,
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: SecretString,
}

impl ClientCredentialsAuth {
    /// Creates a client-credentials configuration.
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }
}

/// Authentication method for the API client.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Static API key in a header or query parameter.
    ApiKey(ApiKeyAuth),
    /// OAuth2 client-credentials grant with token caching.
    ClientCredentials(ClientCredentialsAuth),
}

impl AuthMethod {
    /// Creates a header-based API-key method with the default name.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(ApiKeyAuth::new(key))
    }

    /// Creates a client-credentials method.
    pub fn client_credentials(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::ClientCredentials(ClientCredentialsAuth::new(token_url, client_id, client_secret))
    }

    /// Scheme name for logging. Never exposes secret material.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::ApiKey(_) => "api_key",
            Self::ClientCredentials(_) => "client_credentials",
        }
    }

    /// Validates that required fields are present.
    pub fn validate(&self) -> ApiResult<()> {
        match self {
            Self::ApiKey(auth) => {
                if auth.key.expose_secret().is_empty() {
                    return Err(ApiError::new(ApiErrorKind::MissingAuth, "API key is empty"));
                }
                if auth.name.is_empty() {
                    return Err(ApiError::configuration("API key name is empty"));
                }
            }
            Self::ClientCredentials(auth) => {
                if auth.token_url.is_empty() {
                    return Err(ApiError::new(ApiErrorKind::MissingAuth, "Token URL is empty"));
                }
                if auth.client_id.is_empty() || auth.client_secret.expose_secret().is_empty() {
                    return Err(ApiError::new(
                        ApiErrorKind::MissingAuth,
                        "Client ID and secret are required",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Request-decoration data produced by an authenticator.
#[derive(Debug, Clone, Default)]
pub struct AuthData {
    /// Headers to merge into the request (overriding on collision).
    pub headers: HashMap<String, String>,
    /// Query parameters to append to the request.
    pub params: HashMap<String, String>,
}

/// Token endpoint response (RFC 6749 section 5.1).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,
    /// Token type, usually "Bearer".
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Cached access token.
#[derive(Debug, Clone)]
struct CachedToken {
    token: SecretString,
    /// `None` means the token carries no expiry and never refreshes on its
    /// own; only invalidation clears it.
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > Utc::now() + Duration::seconds(REFRESH_BUFFER_SECS),
            None => true,
        }
    }
}

/// Applies an authentication method to outgoing requests and manages the
/// OAuth2 token lifecycle (fetch, cache, invalidate).
pub struct AuthManager {
    method: AuthMethod,
    transport: Arc<dyn HttpTransport>,
    cached_token: RwLock<Option<CachedToken>>,
}

impl AuthManager {
    /// Creates a new authentication manager, validating the method.
    pub fn new(method: AuthMethod, transport: Arc<dyn HttpTransport>) -> ApiResult<Self> {
        method.validate()?;
        Ok(Self {
            method,
            transport,
            cached_token: RwLock::new(None),
        })
    }

    /// Gets the authentication method.
    pub fn method(&self) -> &AuthMethod {
        &self.method
    }

    /// Returns a decorated copy of the request with auth headers and query
    /// parameters applied. The input is never mutated.
    pub async fn decorate(&self, request: &HttpRequest) -> ApiResult<HttpRequest> {
        let data = self.auth_data().await?;
        let mut decorated = request.clone();
        for (name, value) in data.headers {
            decorated.headers.insert(name, value);
        }
        for (name, value) in data.params {
            decorated.query.push((name, value));
        }
        Ok(decorated)
    }

    /// Produces the headers and query parameters for the active method.
    pub async fn auth_data(&self) -> ApiResult<AuthData> {
        match &self.method {
            AuthMethod::ApiKey(auth) => {
                let mut data = AuthData {
                    headers: auth.extra_headers.clone(),
                    params: HashMap::new(),
                };
                match auth.location {
                    KeyLocation::Header => {
                        // Key header takes precedence over extra headers.
                        data.headers
                            .insert(auth.name.clone(), auth.key.expose_secret().to_string());
                    }
                    KeyLocation::Query => {
                        data.params
                            .insert(auth.name.clone(), auth.key.expose_secret().to_string());
                    }
                }
                Ok(data)
            }
            AuthMethod::ClientCredentials(_) => {
                let token = self.access_token().await?;
                let mut headers = HashMap::new();
                headers.insert(
                    "authorization".to_string(),
                    format!("Bearer {}", token.expose_secret()),
                );
                Ok(AuthData {
                    headers,
                    params: HashMap::new(),
                })
            }
        }
    }

    /// Returns the cached access token, fetching a fresh one when the cache
    /// is empty or within the refresh buffer of expiry.
    pub async fn access_token(&self) -> ApiResult<SecretString> {
        let auth = match &self.method {
            AuthMethod::ClientCredentials(auth) => auth,
            AuthMethod::ApiKey(_) => {
                return Err(ApiError::configuration(
                    "API-key authentication has no token lifecycle",
                ));
            }
        };

        {
            let cache = self.cached_token.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
            }
        }

        let token = self.fetch_token(auth).await?;
        let mut cache = self.cached_token.write().await;
        *cache = Some(token.clone());
        Ok(token.token)
    }

    /// Clears the cached token. The next [`Self::access_token`] call fetches
    /// a fresh one; no refresh happens here. No-op for API-key auth.
    pub async fn invalidate_token(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }

    async fn fetch_token(&self, auth: &ClientCredentialsAuth) -> ApiResult<CachedToken> {
        tracing::debug!(token_url = %auth.token_url, "fetching new access token");

        let request = HttpRequest::post(&auth.token_url)
            .with_header("accept", "application/json")
            .with_form_body(&[
                ("grant_type", "client_credentials"),
                ("client_id", auth.client_id.as_str()),
                ("client_secret", auth.client_secret.expose_secret().as_str()),
            ])?;

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(ApiError::token_fetch(format!(
                "Token endpoint returned HTTP {}",
                response.status
            ))
            .with_status(response.status));
        }

        let token: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            ApiError::new(
                ApiErrorKind::MalformedTokenResponse,
                format!("Token response missing access token: {}", e),
            )
        })?;

        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs as i64));

        Ok(CachedToken {
            token: SecretString::new(token.access_token),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{responses, MockTransport};
    use test_case::test_case;

    fn manager(method: AuthMethod, transport: Arc<MockTransport>) -> AuthManager {
        AuthManager::new(method, transport).unwrap()
    }

    #[tokio::test]
    async fn test_api_key_header_decoration() {
        let transport = Arc::new(MockTransport::new());
        let method = AuthMethod::ApiKey(
            ApiKeyAuth::new("secret-key")
                .with_name("authorization")
                .with_extra_header("accept", "application/json"),
        );
        let auth = manager(method, transport);

        let request = HttpRequest::get("https://api.example.com/orders");
        let decorated = auth.decorate(&request).await.unwrap();

        assert_eq!(
            decorated.headers.get("authorization").map(String::as_str),
            Some("secret-key")
        );
        assert_eq!(
            decorated.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
        assert!(decorated.query.is_empty());
        // Input untouched.
        assert!(request.headers.is_empty());
    }

    #[tokio::test]
    async fn test_api_key_header_wins_over_extra_headers() {
        let transport = Arc::new(MockTransport::new());
        let method = AuthMethod::ApiKey(
            ApiKeyAuth::new("real-key")
                .with_name("x-api-key")
                .with_extra_header("x-api-key", "shadowed"),
        );
        let auth = manager(method, transport);

        let data = auth.auth_data().await.unwrap();
        assert_eq!(data.headers.get("x-api-key").map(String::as_str), Some("real-key"));
    }

    #[tokio::test]
    async fn test_api_key_query_decoration() {
        let transport = Arc::new(MockTransport::new());
        let method = AuthMethod::ApiKey(
            ApiKeyAuth::new("secret-key")
                .with_location(KeyLocation::Query)
                .with_name("appid")
                .with_extra_header("accept", "application/json"),
        );
        let auth = manager(method, transport);

        let decorated = auth
            .decorate(&HttpRequest::get("https://api.example.com/weather"))
            .await
            .unwrap();

        assert!(decorated
            .query
            .contains(&("appid".to_string(), "secret-key".to_string())));
        // Extra headers still apply in query mode.
        assert_eq!(
            decorated.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
        assert!(!decorated.headers.contains_key("appid"));
    }

    #[test_case("", "x-api-key" ; "empty key")]
    #[test_case("key", "" ; "empty name")]
    fn test_api_key_validation(key: &str, name: &str) {
        let method = AuthMethod::ApiKey(ApiKeyAuth::new(key).with_name(name));
        assert!(method.validate().is_err());
    }

    #[test]
    fn test_client_credentials_validation() {
        assert!(AuthMethod::client_credentials("", "id", "secret")
            .validate()
            .is_err());
        assert!(AuthMethod::client_credentials("https://auth.example.com/token", "", "")
            .validate()
            .is_err());
        assert!(
            AuthMethod::client_credentials("https://auth.example.com/token", "id", "secret")
                .validate()
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_token_fetched_once_then_cached() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(responses::token("tok-1", Some(3600)));

        let auth = manager(
            AuthMethod::client_credentials("https://auth.example.com/token", "id", "secret"),
            transport.clone(),
        );

        let first = auth.access_token().await.unwrap();
        let second = auth.access_token().await.unwrap();

        assert_eq!(first.expose_secret(), "tok-1");
        assert_eq!(second.expose_secret(), "tok-1");
        assert_eq!(transport.request_count(), 1);

        let token_request = &transport.requests()[0];
        assert_eq!(token_request.url, "https://auth.example.com/token");
        let body = token_request.body.as_deref().unwrap();
        assert!(body.contains("grant_type=client_credentials"));
        assert!(body.contains("client_id=id"));
        assert!(body.contains("client_secret=secret"));
    }

    #[tokio::test]
    async fn test_invalidate_triggers_exactly_one_refetch() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(responses::token("tok-1", Some(3600)));
        transport.enqueue(responses::token("tok-2", Some(3600)));

        let auth = manager(
            AuthMethod::client_credentials("https://auth.example.com/token", "id", "secret"),
            transport.clone(),
        );

        auth.access_token().await.unwrap();
        auth.invalidate_token().await;

        let refreshed = auth.access_token().await.unwrap();
        assert_eq!(refreshed.expose_secret(), "tok-2");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_token_without_expiry_never_refreshes() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(responses::token("tok-forever", None));

        let auth = manager(
            AuthMethod::client_credentials("https://auth.example.com/token", "id", "secret"),
            transport.clone(),
        );

        auth.access_token().await.unwrap();
        auth.access_token().await.unwrap();
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_token_fetch_failure() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(responses::status(500, r#"{"error":"server_error"}"#));

        let auth = manager(
            AuthMethod::client_credentials("https://auth.example.com/token", "id", "secret"),
            transport,
        );

        let error = auth.access_token().await.unwrap_err();
        assert_eq!(*error.kind(), ApiErrorKind::TokenFetchFailed);
        assert_eq!(error.status_code(), Some(500));
    }

    #[tokio::test]
    async fn test_malformed_token_response() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(responses::status(200, r#"{"token_type":"Bearer"}"#));

        let auth = manager(
            AuthMethod::client_credentials("https://auth.example.com/token", "id", "secret"),
            transport,
        );

        let error = auth.access_token().await.unwrap_err();
        assert_eq!(*error.kind(), ApiErrorKind::MalformedTokenResponse);
    }

    #[tokio::test]
    async fn test_bearer_decoration() {
        let transport = Arc::new(MockTransport::new());
        transport.enqueue(responses::token("tok-1", Some(3600)));

        let auth = manager(
            AuthMethod::client_credentials("https://auth.example.com/token", "id", "secret"),
            transport,
        );

        let decorated = auth
            .decorate(&HttpRequest::get("https://api.example.com/orders"))
            .await
            .unwrap();
        assert_eq!(
            decorated.headers.get("authorization").map(String::as_str),
            Some("Bearer tok-1")
        );
    }

    #[tokio::test]
    async fn test_access_token_rejected_for_api_key() {
        let transport = Arc::new(MockTransport::new());
        let auth = manager(AuthMethod::api_key("key"), transport);
        assert!(auth.access_token().await.is_err());
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!(AuthMethod::api_key("k").scheme(), "api_key");
        assert_eq!(
            AuthMethod::client_credentials("u", "i", "s").scheme(),
            "client_credentials"
        );
    }
}
