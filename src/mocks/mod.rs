//! Mock transport for testing without a network.

use crate::errors::{ApiError, ApiResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Mock HTTP transport with scripted responses and a recorded request
/// history. Responses play back in the order they were enqueued.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    history: Mutex<Vec<HttpRequest>>,
    default_response: Mutex<Option<HttpResponse>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a response.
    pub fn enqueue(&self, response: HttpResponse) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Enqueues a 200 response with a JSON body.
    pub fn enqueue_json(&self, body: &serde_json::Value) -> &Self {
        self.enqueue(responses::status(200, body.to_string()))
    }

    /// Sets the response returned once the queue is empty.
    pub fn set_default_response(&self, response: HttpResponse) -> &Self {
        *self.default_response.lock().unwrap() = Some(response);
        self
    }

    /// Returns all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.history.lock().unwrap().clone()
    }

    /// Returns the last recorded request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.history.lock().unwrap().last().cloned()
    }

    /// Returns the number of requests sent.
    pub fn request_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    /// Clears the recorded history.
    pub fn clear_history(&self) {
        self.history.lock().unwrap().clear();
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        self.history.lock().unwrap().push(request);

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.default_response.lock().unwrap().clone());

        response.ok_or_else(|| ApiError::connection("No mock response available"))
    }
}

/// Canned response constructors.
pub mod responses {
    use super::*;

    /// Response with the given status and body.
    pub fn status(status: u16, body: impl Into<String>) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: body.into(),
        }
    }

    /// 200 response with a JSON value body.
    pub fn ok(body: &serde_json::Value) -> HttpResponse {
        status(200, body.to_string())
    }

    /// 401 Unauthorized response.
    pub fn unauthorized() -> HttpResponse {
        status(401, r#"{"error":"invalid_token"}"#)
    }

    /// 500 Internal Server Error response.
    pub fn server_error() -> HttpResponse {
        status(500, r#"{"error":"internal"}"#)
    }

    /// Successful token endpoint response.
    pub fn token(access_token: &str, expires_in: Option<u64>) -> HttpResponse {
        let mut body = serde_json::json!({
            "access_token": access_token,
            "token_type": "Bearer",
        });
        if let Some(secs) = expires_in {
            body["expires_in"] = serde_json::json!(secs);
        }
        ok(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_responses_play_in_order() {
        let transport = MockTransport::new();
        transport.enqueue(responses::status(200, "first"));
        transport.enqueue(responses::status(200, "second"));

        let first = transport
            .send(HttpRequest::get("https://example.com/a"))
            .await
            .unwrap();
        let second = transport
            .send(HttpRequest::get("https://example.com/b"))
            .await
            .unwrap();

        assert_eq!(first.body, "first");
        assert_eq!(second.body, "second");
        assert_eq!(transport.request_count(), 2);
        assert_eq!(
            transport.last_request().unwrap().url,
            "https://example.com/b"
        );
    }

    #[tokio::test]
    async fn test_empty_queue_without_default_errors() {
        let transport = MockTransport::new();
        let result = transport.send(HttpRequest::get("https://example.com")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_default_response() {
        let transport = MockTransport::new();
        transport.set_default_response(responses::ok(&serde_json::json!({"orders": []})));

        let response = transport
            .send(HttpRequest::get("https://example.com/orders"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }
}
