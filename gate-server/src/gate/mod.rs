pub mod responder;

use crate::session::Session;
use crate::state::AppState;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use gate_client::Authorizer;
use log::{info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use self::responder::{FailureDetail, FailureOutcome};

/// Applies [`AuthorizeGate`] around a router.
///
/// The gate must wrap the router itself (not individual routes) so that a
/// redirect failure can rewrite the request URI and re-enter routing, the
/// way a servlet filter forwards to an error page.
#[derive(Clone)]
pub struct AuthorizeGateLayer {
    state: AppState,
}

impl AuthorizeGateLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for AuthorizeGateLayer {
    type Service = AuthorizeGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthorizeGate {
            inner,
            state: self.state.clone(),
        }
    }
}

/// Request interceptor enforcing authorization on the protected routes.
///
/// Stateless across requests; the shared configuration, authorizer and
/// session store handles are all read-only after startup.
#[derive(Clone)]
pub struct AuthorizeGate<S> {
    inner: S,
    state: AppState,
}

impl<S> Service<Request<Body>> for AuthorizeGate<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // Readiness was established for `self.inner`; the clone takes its
        // place and the ready instance moves into the future.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();
        Box::pin(handle(state, inner, request))
    }
}

async fn handle<S>(
    state: AppState,
    mut inner: S,
    mut request: Request<Body>,
) -> Result<Response, Infallible>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Send,
    S::Future: Send,
{
    if !is_protected(request.uri().path(), &state.config.filter.protected_prefix) {
        return inner.call(request).await;
    }

    let filter = &state.config.filter;
    let app_id = query_param(&request, &filter.id_param);
    let app_key = query_param(&request, &filter.key_param);
    let referrer = query_param(&request, &filter.referrer_param);

    let (session, minted) = resolve_session(&state, &request);

    // A verdict cached by an earlier request must never survive into a
    // request that is about to fail or omits credentials.
    if let Err(e) = session.remove(&filter.session_attr).await {
        warn!("failed to clear cached verdict: {e}");
    }

    let detail = match &app_id {
        None => {
            warn!("{} missing in request", filter.id_param);
            Some(FailureDetail::missing_app_id())
        }
        Some(app_id) => {
            match state
                .authorizer
                .authorize(app_id, app_key.as_deref(), referrer.as_deref())
                .await
            {
                Ok(verdict) if verdict.authorized => {
                    info!("authorized ok for: {app_id}");
                    if let Err(e) = session.set(&filter.session_attr, &verdict).await {
                        warn!("failed to cache verdict: {e}");
                    }
                    request.extensions_mut().insert(session.clone());
                    None
                }
                Ok(verdict) => {
                    warn!("authorize failed for: {app_id}");
                    Some(FailureDetail::Denied { verdict })
                }
                Err(e) => {
                    warn!("authorize call failed for {app_id}: {e}");
                    Some(FailureDetail::ClientError {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
    };

    let mut response = match detail {
        None => inner.call(request).await?,
        Some(detail) => match state.responder.respond(request, detail) {
            FailureOutcome::Respond(response) => response,
            FailureOutcome::Forward(forwarded) => inner.call(forwarded).await?,
        },
    };

    if let Some(id) = minted {
        let cookie = format!("{}={}; Path=/; HttpOnly", state.config.session.cookie, id);
        if let Ok(value) = header::HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(response)
}

/// Whether a path falls under the protected prefix.
///
/// The prefix matches itself and its subtree only; with prefix `/api`,
/// `/api` and `/api/ping` are protected while `/apifoo` is not.
fn is_protected(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Read a named query parameter; a present-but-empty parameter counts as
/// present, matching servlet getParameter semantics.
fn query_param(request: &Request<Body>, name: &str) -> Option<String> {
    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Resolve the caller's session from the session cookie, minting a fresh
/// id when the caller does not carry one yet.
fn resolve_session(state: &AppState, request: &Request<Body>) -> (Session, Option<String>) {
    let cookie_name = &state.config.session.cookie;
    let existing = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').map(str::trim).find_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                (name == cookie_name.as_str()).then(|| value.to_string())
            })
        });

    match existing {
        Some(id) => (Session::new(state.sessions.clone(), id), None),
        None => {
            let id: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(32)
                .map(char::from)
                .collect();
            (Session::new(state.sessions.clone(), id.clone()), Some(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;
    use crate::session::memory::InMemorySessions;
    use crate::session::{SessionBackend, SessionStore};
    use crate::state::AppState;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use gate_client::{AuthorizeError, AuthorizerType, MockAuthorizer, Verdict};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    const MISSING_APP_ID_XML: &str = "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
        <error code=\"api_id_not_set\">app_id was not provided in the request</error>";

    async fn error_probe(request: Request<Body>) -> String {
        match request.extensions().get::<FailureDetail>() {
            Some(detail) => serde_json::to_string(detail).unwrap(),
            None => "no detail".to_string(),
        }
    }

    fn test_config() -> GateConfig {
        let mut config = GateConfig::default();
        config.service.provider_key = "test_provider_key".to_string();
        config
    }

    fn gated_app(
        config: GateConfig,
        mock: MockAuthorizer,
    ) -> (AuthorizeGate<Router>, Arc<SessionStore>) {
        let sessions =
            SessionStore::InMemory(InMemorySessions::new(60, 16).expect("failed to create store"));
        let state = AppState::with_parts(config, AuthorizerType::Mock(mock), sessions);
        let sessions = state.sessions.clone();

        let router = Router::new()
            .route("/api/ping", get(|| async { "pong" }))
            .route("/apifoo", get(|| async { "open" }))
            .route("/error", get(error_probe));
        (AuthorizeGateLayer::new(state).layer(router), sessions)
    }

    async fn send(
        app: &AuthorizeGate<Router>,
        uri: &str,
        cookie: Option<&str>,
    ) -> (StatusCode, HeaderMap, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).expect("Failed to build request");

        let response = app
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
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    fn session_cookie(headers: &HeaderMap) -> String {
        let cookie = headers
            .get(header::SET_COOKIE)
            .expect("expected a session cookie")
            .to_str()
            .unwrap();
        let (pair, _) = cookie.split_once(';').unwrap();
        pair.split_once('=').unwrap().1.to_string()
    }

    #[tokio::test]
    async fn test_authorized_request_continues_and_caches_verdict() {
        let mock = MockAuthorizer::new().with_verdict(Verdict::allow());
        let (app, sessions) = gated_app(test_config(), mock.clone());

        let (status, headers, body) =
            send(&app, "/api/ping?app_id=acme&app_key=key1&referrer=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");
        assert_eq!(mock.calls(), 1);

        let sid = session_cookie(&headers);
        let cached: Option<Verdict> = sessions
            .get(&sid, "authorize_response")
            .await
            .expect("failed to read store");
        assert_eq!(cached, Some(Verdict::allow()));
    }

    #[tokio::test]
    async fn test_missing_app_id_short_circuits() {
        let mock = MockAuthorizer::new();
        let (app, _) = gated_app(test_config(), mock.clone());

        let (status, headers, body) = send(&app, "/api/ping", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, MISSING_APP_ID_XML);
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/xml"
        );
        // The guard fires before any remote call
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_denied_verdict_blocks_continuation() {
        let mock = MockAuthorizer::new().with_verdict(Verdict::deny("limits_exceeded"));
        let (app, _) = gated_app(test_config(), mock.clone());

        let (status, _, body) = send(&app, "/api/ping?app_id=acme", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "limits_exceeded");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_client_error_rendered_inline() {
        let mock = MockAuthorizer::new().with_error(AuthorizeError::Response {
            status: 403,
            code: "invalid_key".to_string(),
            message: "application key is invalid".to_string(),
        });
        let (app, _) = gated_app(test_config(), mock);

        let (status, _, body) = send(&app, "/api/ping?app_id=acme&app_key=bad", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<error code=\"invalid_key\">"));
        assert!(body.contains("application key is invalid"));
    }

    #[tokio::test]
    async fn test_redirect_forwards_with_detail_attached() {
        let mut config = test_config();
        config.filter.redirect_url = Some("/error".to_string());
        let mock = MockAuthorizer::new().with_error(AuthorizeError::Response {
            status: 403,
            code: "invalid_key".to_string(),
            message: "application key is invalid".to_string(),
        });
        let (app, _) = gated_app(config, mock);

        let (status, _, body) = send(&app, "/api/ping?app_id=acme", None).await;
        // The error endpoint controls the final response; the gate writes
        // no status of its own.
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"kind\":\"client_error\""));
        assert!(body.contains("invalid_key"));
    }

    #[tokio::test]
    async fn test_redirect_forwards_denied_verdict() {
        let mut config = test_config();
        config.filter.redirect_url = Some("/error".to_string());
        let mock = MockAuthorizer::new().with_verdict(Verdict::deny("limits_exceeded"));
        let (app, _) = gated_app(config, mock);

        let (status, _, body) = send(&app, "/api/ping?app_id=acme", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"kind\":\"denied\""));
        assert!(body.contains("limits_exceeded"));
    }

    #[tokio::test]
    async fn test_stale_verdict_cleared_before_guard() {
        let mock = MockAuthorizer::new();
        let (app, sessions) = gated_app(test_config(), mock);

        sessions
            .set("sid-1", "authorize_response", &Verdict::allow())
            .await
            .expect("failed to seed store");

        // Request without credentials fails, and the stale verdict is gone
        let (status, _, _) = send(&app, "/api/ping", Some("gate_session=sid-1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let cached: Option<Verdict> = sessions
            .get("sid-1", "authorize_response")
            .await
            .expect("failed to read store");
        assert_eq!(cached, None);
    }

    #[tokio::test]
    async fn test_stale_verdict_cleared_before_denied_call() {
        let mock = MockAuthorizer::new().with_verdict(Verdict::deny("limits_exceeded"));
        let (app, sessions) = gated_app(test_config(), mock);

        sessions
            .set("sid-2", "authorize_response", &Verdict::allow())
            .await
            .expect("failed to seed store");

        let (status, _, _) = send(
            &app,
            "/api/ping?app_id=acme",
            Some("gate_session=sid-2"),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let cached: Option<Verdict> = sessions
            .get("sid-2", "authorize_response")
            .await
            .expect("failed to read store");
        assert_eq!(cached, None);
    }

    #[tokio::test]
    async fn test_unprotected_paths_pass_through() {
        let mock = MockAuthorizer::new();
        let (app, _) = gated_app(test_config(), mock.clone());

        let (status, _, body) = send(&app, "/error", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "no detail");
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_prefix_matches_subtree_not_sibling_paths() {
        let mock = MockAuthorizer::new();
        let (app, _) = gated_app(test_config(), mock.clone());

        // Shares the prefix characters but is not under /api
        let (status, _, body) = send(&app, "/apifoo", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "open");
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_is_protected() {
        assert!(is_protected("/api", "/api"));
        assert!(is_protected("/api/ping", "/api"));
        assert!(!is_protected("/apifoo", "/api"));
        assert!(!is_protected("/health", "/api"));
    }

    #[tokio::test]
    async fn test_existing_session_cookie_is_reused() {
        let mock = MockAuthorizer::new().with_verdict(Verdict::allow());
        let (app, sessions) = gated_app(test_config(), mock);

        let (status, headers, _) = send(
            &app,
            "/api/ping?app_id=acme",
            Some("other=1; gate_session=sid-7"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // No new cookie minted for a known caller
        assert!(headers.get(header::SET_COOKIE).is_none());

        let cached: Option<Verdict> = sessions
            .get("sid-7", "authorize_response")
            .await
            .expect("failed to read store");
        assert_eq!(cached, Some(Verdict::allow()));
    }
}
