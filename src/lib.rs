//! # Universal API Client
//!
//! A generic HTTP API client with:
//! - Pluggable authentication (API key in header or query, OAuth2
//!   client-credentials with token caching)
//! - A single bounded 401 refresh-and-retry cycle
//! - Three pagination strategies (offset/limit, page number, has-more/cursor)
//!   behind one driver
//! - A transport trait for testing without a network
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use universal_api_client::{ApiClient, AuthMethod, OffsetPagination, PaginationStrategy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::builder()
//!         .base_url("https://api.example.com")
//!         .auth(AuthMethod::api_key("secret-key"))
//!         .build()?;
//!
//!     let strategy = PaginationStrategy::Offset(OffsetPagination::new().with_limit(50));
//!     let orders = client.fetch_all("/orders", &[], &strategy).await?;
//!     println!("fetched {} orders", orders.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;

// Authentication
pub mod auth;

// HTTP transport and execution
pub mod executor;
pub mod transport;

// Pagination handling
pub mod pagination;

// Client facade and paginated-fetch driver
pub mod client;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use auth::{ApiKeyAuth, AuthManager, AuthMethod, ClientCredentialsAuth, KeyLocation};
pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use errors::{ApiError, ApiErrorKind, ApiResult};
pub use executor::RequestExecutor;
pub use pagination::{
    CursorPagination, OffsetPagination, PagePagination, PaginationState, PaginationStrategy,
};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
