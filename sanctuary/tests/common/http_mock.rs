//! HTTP mock server helpers for testing outbound HTTP calls.
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::common::http_mock::MockHttpServer;
//!
//! #[tokio::test]
//! async fn test_external_api_call() {
//!     let server = MockHttpServer::start().await;
//!
//!     server
//!         .expect_post("/api/verify-premium")
//!         .respond_with_json(json!({"success": true}))
//!         .mount()
//!         .await;
//!
//!     // Point the client at server.url()
//! }
//! ```

use serde_json::Value;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Running stub server.
pub struct MockHttpServer {
    inner: MockServer,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        Self {
            inner: MockServer::start().await,
        }
    }

    /// Base URL of the server, without a trailing slash.
    pub fn url(&self) -> String {
        self.inner.uri()
    }

    pub fn expect_post(&self, route: &str) -> StubBuilder<'_> {
        StubBuilder {
            server: &self.inner,
            route: route.to_string(),
            body: None,
            status: 200,
            response: None,
            times: None,
        }
    }
}

/// Declarative stub for one route.
pub struct StubBuilder<'a> {
    server: &'a MockServer,
    route: String,
    body: Option<Value>,
    status: u16,
    response: Option<Value>,
    times: Option<u64>,
}

impl StubBuilder<'_> {
    /// Only match requests whose JSON body equals `body`.
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn respond_with_json(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    pub fn respond_with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Fail the test on drop unless the route was hit exactly `times` times.
    pub fn expect_times(mut self, times: u64) -> Self {
        self.times = Some(times);
        self
    }

    pub async fn mount(self) {
        let mut template = ResponseTemplate::new(self.status);
        if let Some(response) = self.response {
            template = template.set_body_json(response);
        }

        let mut mock = Mock::given(method("POST")).and(path(self.route));
        if let Some(body) = self.body {
            mock = mock.and(body_json(body));
        }
        let mut mock = mock.respond_with(template);
        if let Some(times) = self.times {
            mock = mock.expect(times);
        }
        mock.mount(self.server).await;
    }
}
