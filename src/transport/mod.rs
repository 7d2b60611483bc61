//! HTTP transport abstraction.
//!
//! The client core is written against the [`HttpTransport`] trait so the
//! network edge can be swapped out in tests. [`ReqwestTransport`] is the
//! production implementation.

use crate::errors::{ApiError, ApiErrorKind, ApiResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
}

impl HttpMethod {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A single outgoing request, built per call and consumed by the transport.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL (without query string).
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Query parameters, appended to the URL by the transport.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Creates a GET request for the given URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request for the given URL.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter.
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body and content type.
    pub fn with_json_body<T: serde::Serialize>(mut self, body: &T) -> ApiResult<Self> {
        let encoded = serde_json::to_string(body)
            .map_err(|e| ApiError::new(ApiErrorKind::InvalidParameter, format!("Failed to serialize body: {}", e)))?;
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        self.body = Some(encoded);
        Ok(self)
    }

    /// Sets a form-encoded body and content type.
    pub fn with_form_body(mut self, params: &[(&str, &str)]) -> ApiResult<Self> {
        let encoded = serde_urlencoded::to_string(params).map_err(|e| {
            ApiError::new(ApiErrorKind::InvalidParameter, format!("Failed to encode form body: {}", e))
        })?;
        self.headers.insert(
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        self.body = Some(encoded);
        Ok(self)
    }
}

/// An HTTP response as seen by the client core.
///
/// Non-success statuses are carried as data, not errors, so callers can
/// inspect the status and body themselves.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers (lowercased names).
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> ApiResult<serde_json::Value> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::deserialization(format!("Invalid JSON body: {}", e)))
    }

    /// Deserializes the body into a typed value.
    pub fn json_as<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::deserialization(format!("Failed to deserialize body: {}", e)))
    }
}

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends an HTTP request and awaits the response.
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse>;
}

/// Default reqwest-based HTTP transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with default timeouts.
    pub fn new() -> ApiResult<Self> {
        Self::with_timeouts(Duration::from_secs(30), Duration::from_secs(10))
    }

    /// Creates a transport with custom request and connect timeouts.
    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                ApiError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::timeout(format!("Request timed out: {}", e))
            } else if e.is_connect() {
                ApiError::connection(format!("Connection failed: {}", e))
            } else {
                ApiError::connection(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), v.to_string());
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::connection(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
