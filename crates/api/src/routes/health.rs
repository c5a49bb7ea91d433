use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = bazaar_db::health_check(&state.pool).await.is_ok();
    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// Mount health check routes (root level, outside `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
