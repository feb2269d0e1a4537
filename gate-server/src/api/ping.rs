use crate::session::Session;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    routing::get,
    Json, Router,
};
use gate_client::Verdict;
use serde_json::{json, Value};

/// Sample protected endpoint.
///
/// Only reachable once the gate has authorized the caller; echoes the
/// plan from the cached verdict to show downstream handlers can read it.
async fn ping(State(state): State<AppState>, request: Request) -> Json<Value> {
    let verdict: Option<Verdict> = match request.extensions().get::<Session>() {
        Some(session) => session
            .get(&state.config.filter.session_attr)
            .await
            .unwrap_or(None),
        None => None,
    };

    let plan = verdict
        .as_ref()
        .and_then(|verdict| verdict.extra.get("plan"))
        .cloned();
    Json(json!({ "message": "pong", "plan": plan }))
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/api/ping", get(ping))
}
