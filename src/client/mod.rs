//! API client implementation.

use crate::auth::AuthManager;
use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::errors::{ApiError, ApiErrorKind, ApiResult};
use crate::executor::RequestExecutor;
use crate::pagination::PaginationStrategy;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Generic API client.
///
/// Holds exactly one authentication method for its lifetime and drives
/// paginated fetches strictly sequentially: each request is awaited before
/// the next is built.
pub struct ApiClient {
    config: ClientConfig,
    auth: AuthManager,
    executor: RequestExecutor,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client with the default reqwest transport.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let transport = Arc::new(ReqwestTransport::with_timeouts(
            config.timeout,
            config.connect_timeout,
        )?);
        Self::with_transport(config, transport)
    }

    /// Creates a client over a caller-supplied transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> ApiResult<Self> {
        config.validate()?;

        let method = config
            .auth
            .clone()
            .ok_or_else(|| ApiError::new(ApiErrorKind::MissingAuth, "Authentication required"))?;
        let auth = AuthManager::new(method, transport.clone())?;
        let executor = RequestExecutor::new(transport);

        Ok(Self {
            config,
            auth,
            executor,
        })
    }

    /// Creates a new client builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Makes a GET request. Non-2xx responses are returned as data.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<HttpResponse> {
        let request = self.base_request(HttpRequest::get(self.build_url(path)), query);
        self.executor.execute(&request, &self.auth).await
    }

    /// Makes a POST request with a JSON body. Non-2xx responses are returned
    /// as data.
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<HttpResponse> {
        let request = self
            .base_request(HttpRequest::post(self.build_url(path)), &[])
            .with_json_body(body)?;
        self.executor.execute(&request, &self.auth).await
    }

    /// Fetches every page of a collection endpoint under the given strategy
    /// and returns the items in arrival order.
    ///
    /// Strategy parameters override `base_query` entries on name collision.
    /// Termination is the strategy's responsibility; the driver imposes no
    /// iteration cap of its own. A non-2xx page response aborts the fetch
    /// with an error carrying the status.
    pub async fn fetch_all(
        &self,
        path: &str,
        base_query: &[(&str, &str)],
        strategy: &PaginationStrategy,
    ) -> ApiResult<Vec<Value>> {
        let mut state = strategy.initial_state();
        let mut results = Vec::new();

        loop {
            let params = strategy.next_params(&state);

            let mut request = self.base_request(HttpRequest::get(self.build_url(path)), &[]);
            for (name, value) in base_query {
                if !params.iter().any(|(p, _)| p == name) {
                    request.query.push((name.to_string(), value.to_string()));
                }
            }
            request.query.extend(params);

            let response = self.executor.execute(&request, &self.auth).await?;
            if !response.is_success() {
                return Err(ApiError::from_status(
                    response.status,
                    format!("Paginated fetch of {} failed", path),
                ));
            }

            let body = response.json()?;
            let items = strategy.extract_items(&body);
            tracing::debug!(
                path,
                state = ?state,
                fetched = items.len(),
                accumulated = results.len() + items.len(),
                "fetched page"
            );
            results.extend(items);

            if strategy.should_stop(&state, &body) {
                return Ok(results);
            }
            state = strategy.advance(&state, &body);
        }
    }

    /// Like [`Self::fetch_all`], deserializing each item.
    pub async fn fetch_all_as<T: DeserializeOwned>(
        &self,
        path: &str,
        base_query: &[(&str, &str)],
        strategy: &PaginationStrategy,
    ) -> ApiResult<Vec<T>> {
        let items = self.fetch_all(path, base_query, strategy).await?;
        items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| {
                    ApiError::deserialization(format!("Failed to deserialize item: {}", e))
                })
            })
            .collect()
    }

    fn base_request(&self, mut request: HttpRequest, query: &[(&str, &str)]) -> HttpRequest {
        request = request
            .with_header("user-agent", &self.config.user_agent)
            .with_header("accept", "application/json");
        for (name, value) in query {
            request.query.push((name.to_string(), value.to_string()));
        }
        request
    }

    fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config_builder: ClientConfigBuilder,
}

impl ApiClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config_builder: ClientConfig::builder(),
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(url);
        self
    }

    /// Sets the authentication method.
    pub fn auth(mut self, auth: crate::auth::AuthMethod) -> Self {
        self.config_builder = self.config_builder.auth(auth);
        self
    }

    /// Sets a header-based API key with the default name.
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.auth(crate::auth::AuthMethod::api_key(key))
    }

    /// Sets OAuth2 client credentials.
    pub fn client_credentials(
        self,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.auth(crate::auth::AuthMethod::client_credentials(
            token_url,
            client_id,
            client_secret,
        ))
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(ua);
        self
    }

    /// Builds the client.
    pub fn build(self) -> ApiResult<ApiClient> {
        let config = self.config_builder.build()?;
        ApiClient::new(config)
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
