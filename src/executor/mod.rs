//! Request execution with a single bounded 401 retry.

use crate::auth::AuthManager;
use crate::errors::ApiResult;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use std::sync::Arc;

/// Issues a single authenticated request.
///
/// The only built-in retry is the one-shot 401 cycle: invalidate the cached
/// credentials, re-decorate the original request, send once more, and return
/// that response whatever its status. Every other status is returned as data;
/// transport failures propagate untouched.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
}

impl RequestExecutor {
    /// Creates an executor over the given transport.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Executes the request with authentication applied.
    pub async fn execute(
        &self,
        request: &HttpRequest,
        auth: &AuthManager,
    ) -> ApiResult<HttpResponse> {
        let decorated = auth.decorate(request).await?;
        let response = self.transport.send(decorated).await?;

        if response.status != 401 {
            return Ok(response);
        }

        tracing::warn!(
            url = %request.url,
            scheme = auth.method().scheme(),
            "received 401, invalidating credentials and retrying once"
        );
        auth.invalidate_token().await;

        // Decorate the original request again; for OAuth2 this fetches a
        // fresh token lazily. The second response is final.
        let retried = auth.decorate(request).await?;
        self.transport.send(retried).await
    }
}
