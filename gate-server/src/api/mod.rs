pub(crate) mod error_page;
pub(crate) mod health;
pub(crate) mod ping;

use crate::state::AppState;
use axum::Router;

/// Combines all API routes into a single router.
///
/// `/health` and `/error` sit outside the protected prefix; everything
/// under `/api` only runs once the gate has authorized the caller.
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(error_page::router())
        .merge(ping::router())
}
