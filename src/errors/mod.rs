//! Error types for the API client.

use std::fmt;
use thiserror::Error;

/// Result type alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error kinds for categorizing client errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    // Configuration errors
    /// Missing authentication configuration.
    MissingAuth,
    /// Invalid base URL.
    InvalidBaseUrl,
    /// Invalid configuration.
    InvalidConfiguration,

    // Authentication errors
    /// Token endpoint returned a non-success status.
    TokenFetchFailed,
    /// Token response body lacked an access token.
    MalformedTokenResponse,
    /// Credentials rejected (401 after the retry cycle).
    BadCredentials,

    // Transport errors
    /// Connection failed.
    ConnectionFailed,
    /// Request timed out.
    Timeout,

    // Request/response errors
    /// Invalid request parameter.
    InvalidParameter,
    /// Failed to deserialize a response body.
    DeserializationError,

    // Status-derived errors (paginated fetch abort path)
    /// Resource not found (404).
    NotFound,
    /// Access forbidden (403).
    Forbidden,
    /// Server-side error (5xx).
    ServerError,
    /// Other non-success HTTP status.
    HttpStatus,

    /// Unknown error.
    Unknown,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAuth => write!(f, "missing_auth"),
            Self::InvalidBaseUrl => write!(f, "invalid_base_url"),
            Self::InvalidConfiguration => write!(f, "invalid_configuration"),
            Self::TokenFetchFailed => write!(f, "token_fetch_failed"),
            Self::MalformedTokenResponse => write!(f, "malformed_token_response"),
            Self::BadCredentials => write!(f, "bad_credentials"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::InvalidParameter => write!(f, "invalid_parameter"),
            Self::DeserializationError => write!(f, "deserialization_error"),
            Self::NotFound => write!(f, "not_found"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::ServerError => write!(f, "server_error"),
            Self::HttpStatus => write!(f, "http_status"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// API client error with detailed information.
#[derive(Error, Debug)]
pub struct ApiError {
    /// Error kind.
    kind: ApiErrorKind,
    /// Error message.
    message: String,
    /// HTTP status code (if the error came from a response).
    status_code: Option<u16>,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " (HTTP {})", code)?;
        }
        Ok(())
    }
}

impl ApiError {
    /// Creates a new client error.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            cause: None,
        }
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    /// Gets the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Gets the HTTP status code.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Returns true for configuration errors (fatal, never retried).
    pub fn is_config_error(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::MissingAuth
                | ApiErrorKind::InvalidBaseUrl
                | ApiErrorKind::InvalidConfiguration
        )
    }

    /// Returns true for authentication errors.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::TokenFetchFailed
                | ApiErrorKind::MalformedTokenResponse
                | ApiErrorKind::BadCredentials
        )
    }

    /// Returns true for transport-level failures.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::ConnectionFailed | ApiErrorKind::Timeout
        )
    }

    /// Creates an error from an HTTP status code and message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(Self::kind_from_status(status), message).with_status(status)
    }

    /// Maps an HTTP status code to an error kind.
    fn kind_from_status(status: u16) -> ApiErrorKind {
        match status {
            401 => ApiErrorKind::BadCredentials,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            500..=599 => ApiErrorKind::ServerError,
            _ => ApiErrorKind::HttpStatus,
        }
    }

    // Convenience constructors

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidConfiguration, message)
    }

    /// Creates a token fetch error.
    pub fn token_fetch(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::TokenFetchFailed, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::ConnectionFailed, message)
    }

    /// Creates a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::DeserializationError, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ApiError::new(ApiErrorKind::NotFound, "order not found").with_status(404);

        let display = format!("{}", error);
        assert!(display.contains("not_found"));
        assert!(display.contains("order not found"));
        assert!(display.contains("404"));
    }

    #[test]
    fn test_categorization() {
        assert!(ApiError::new(ApiErrorKind::MissingAuth, "no auth").is_config_error());
        assert!(ApiError::token_fetch("denied").is_auth_error());
        assert!(ApiError::timeout("timed out").is_transport_error());

        let http = ApiError::from_status(503, "unavailable");
        assert!(!http.is_config_error());
        assert!(!http.is_auth_error());
        assert!(!http.is_transport_error());
    }

    #[test]
    fn test_from_status() {
        assert_eq!(*ApiError::from_status(401, "x").kind(), ApiErrorKind::BadCredentials);
        assert_eq!(*ApiError::from_status(404, "x").kind(), ApiErrorKind::NotFound);
        assert_eq!(*ApiError::from_status(502, "x").kind(), ApiErrorKind::ServerError);
        assert_eq!(*ApiError::from_status(418, "x").kind(), ApiErrorKind::HttpStatus);
        assert_eq!(ApiError::from_status(404, "x").status_code(), Some(404));
    }
}
