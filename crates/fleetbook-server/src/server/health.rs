//! Liveness probe.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.ping().await;
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
