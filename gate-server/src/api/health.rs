use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;

/// Basic health check response
#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    #[serde(skip)]
    status_code: StatusCode,
}

impl IntoResponse for Health {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": self.status
        });
        (self.status_code, axum::Json(body)).into_response()
    }
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.health_check().await {
        Health {
            status: "ok",
            status_code: StatusCode::OK,
        }
    } else {
        Health {
            status: "unavailable",
            status_code: StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
