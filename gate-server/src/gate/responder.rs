use crate::config::FilterConfig;
use axum::body::Body;
use axum::http::{header, Request, StatusCode, Uri};
use axum::response::Response;
use gate_client::Verdict;
use log::warn;
use serde::Serialize;

pub const MISSING_APP_ID_CODE: &str = "api_id_not_set";
pub const MISSING_APP_ID_MESSAGE: &str = "app_id was not provided in the request";

/// What the gate knows about a failed request.
///
/// Constructed by the gate, consumed exactly once by the responder.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureDetail {
    /// The service answered, with a negative verdict
    Denied { verdict: Verdict },
    /// The authorize call could not be completed, or the request carried
    /// no application id at all
    ClientError { code: String, message: String },
}

impl FailureDetail {
    pub fn missing_app_id() -> Self {
        Self::ClientError {
            code: MISSING_APP_ID_CODE.to_string(),
            message: MISSING_APP_ID_MESSAGE.to_string(),
        }
    }

    /// Status written by the inline responder. Denials map to 409; both
    /// client errors and a missing app id keep the historical 404.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Denied { .. } => StatusCode::CONFLICT,
            Self::ClientError { .. } => StatusCode::NOT_FOUND,
        }
    }
}

/// What the gate should do with a failed request: either a ready response,
/// or a rewritten request to forward through the router.
pub enum FailureOutcome {
    Respond(Response),
    Forward(Request<Body>),
}

/// Failure policy, fixed once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureResponder {
    /// Write the status and an error body directly
    Inline,
    /// Forward the request internally to an error-handling endpoint,
    /// which controls the final response
    Redirect { target: String },
}

impl FailureResponder {
    /// A configured redirect target selects the redirect strategy
    pub fn from_config(config: &FilterConfig) -> Self {
        match &config.redirect_url {
            Some(target) => Self::Redirect {
                target: target.clone(),
            },
            None => Self::Inline,
        }
    }

    /// Exactly one of status-writing or forwarding happens per call.
    pub fn respond(&self, request: Request<Body>, detail: FailureDetail) -> FailureOutcome {
        match self {
            Self::Inline => FailureOutcome::Respond(inline_response(detail)),
            Self::Redirect { target } => match target.parse::<Uri>() {
                Ok(uri) => FailureOutcome::Forward(forward_request(request, uri, detail)),
                Err(e) => {
                    // A malformed target must not leak the request to the
                    // protected handler it was originally routed to.
                    warn!("invalid redirect target {target}: {e}");
                    FailureOutcome::Respond(inline_response(detail))
                }
            },
        }
    }
}

fn inline_response(detail: FailureDetail) -> Response {
    let status = detail.status();
    match detail {
        FailureDetail::ClientError { code, message } => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/xml")
            .body(Body::from(error_envelope(&code, &message)))
            .expect("Failed to create response"),
        FailureDetail::Denied { verdict } => {
            let body = verdict
                .reason()
                .map(str::to_string)
                .unwrap_or_else(|| "authorization was denied".to_string());
            Response::builder()
                .status(status)
                .body(Body::from(body))
                .expect("Failed to create response")
        }
    }
}

fn error_envelope(code: &str, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<error code=\"{code}\">{message}</error>"
    )
}

/// Rewrite the request to the target, keeping the original query string so
/// the error endpoint still sees the caller's parameters. A query on the
/// target itself comes first.
fn forward_request(mut request: Request<Body>, target: Uri, detail: FailureDetail) -> Request<Body> {
    let rewritten = match (target.query(), request.uri().query()) {
        (Some(tq), Some(oq)) => format!("{}?{tq}&{oq}", target.path()),
        (Some(tq), None) => format!("{}?{tq}", target.path()),
        (None, Some(oq)) => format!("{}?{oq}", target.path()),
        (None, None) => target.path().to_string(),
    };
    *request.uri_mut() = rewritten.parse::<Uri>().unwrap_or(target);
    request.extensions_mut().insert(detail);
    request
}
