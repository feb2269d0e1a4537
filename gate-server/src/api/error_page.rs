use crate::gate::responder::FailureDetail;
use crate::state::AppState;
use axum::{
    extract::Request, http::StatusCode, response::IntoResponse, routing::any, Json, Router,
};

/// Built-in target for the redirect failure strategy.
///
/// Deployments normally point `redirect_url` at a page of their own; this
/// handler renders the forwarded failure detail so redirect mode works
/// out of the box. A direct hit without a forwarded detail is rejected.
async fn error_page(request: Request) -> impl IntoResponse {
    match request.extensions().get::<FailureDetail>() {
        Some(detail) => Json(serde_json::json!({ "error": detail })).into_response(),
        None => (StatusCode::NOT_FOUND, "no failure detail attached").into_response(),
    }
}

pub(super) fn router() -> Router<AppState> {
    // `any` because the forwarded request keeps its original method
    Router::new().route("/error", any(error_page))
}
