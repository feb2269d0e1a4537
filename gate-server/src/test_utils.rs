use crate::config::GateConfig;
use crate::create_app;
use crate::gate::{AuthorizeGate, AuthorizeGateLayer};
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde_json::Value;
use tower::{Layer, ServiceExt};
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Test fixture wiring the full application — gate layer, router, session
/// store — against a wiremock stand-in for the authorization service.
pub struct TestFixture {
    /// The gated application
    pub app: AuthorizeGate<Router>,
    /// Mock server playing the authorization service
    pub service_mock: MockServer,
    /// Application state, for direct store inspection
    pub state: AppState,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build a fixture, letting the test adjust configuration before the
    /// state is assembled (e.g. setting a redirect target).
    pub async fn with_config(mutate: impl FnOnce(&mut GateConfig)) -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let service_mock = MockServer::start().await;
        let mut config = GateConfig::for_test_with_mock(&service_mock);
        mutate(&mut config);

        let state = AppState::new(config).expect("Failed to initialize application state");
        let app = AuthorizeGateLayer::new(state.clone()).layer(create_app(state.clone()));

        Self {
            app,
            service_mock,
            state,
        }
    }

    /// Script the authorization service's answer to the next authorize call
    pub async fn mock_authorize_response(&self, status: u16, body: Value) {
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/transactions/authorize.json"))
            .and(matchers::query_param(
                "provider_key",
                "test_provider_key",
            ))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.service_mock)
            .await;
    }

    /// Sends a GET request through the gated application
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        }
    }
}

/// Response from a test request with convenient assertion helpers
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {} with body: {}",
            expected, self.status, self.body
        );
        self
    }

    /// Response body parsed as JSON; empty or non-JSON bodies become `{}`
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| serde_json::json!({}))
    }
}
