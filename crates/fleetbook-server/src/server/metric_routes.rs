//! Metric store routes.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use fleetbook_core::time::parse_instant_millis;

use super::AppState;
use super::error::ApiError;
use super::ingest::{IngestOutcome, ingest_batch};
use super::server_routes::canonical_server_id;
use super::views::{LatestMetricView, MetricView};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub items: Vec<Value>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/servers/{id}/metrics/latest", get(latest))
        .route("/api/servers/{id}/metrics/{metric}", get(history))
        .route("/api/metrics/ingest", post(ingest))
}

/// `GET /api/servers/{id}/metrics/latest`
#[instrument(skip(state))]
async fn latest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LatestMetricView>>, ApiError> {
    let rows = state.db.latest_metrics(&canonical_server_id(&id)).await?;
    Ok(Json(rows.into_iter().map(LatestMetricView::from).collect()))
}

/// `GET /api/servers/{id}/metrics/{metric}?from&to`
#[instrument(skip(state))]
async fn history(
    State(state): State<AppState>,
    Path((id, metric)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MetricView>>, ApiError> {
    let from = parse_bound("from", query.from.as_deref())?;
    let to = parse_bound("to", query.to.as_deref())?;

    let rows = state
        .db
        .metric_history(&canonical_server_id(&id), &metric, from, to)
        .await?;
    Ok(Json(rows.into_iter().map(MetricView::from).collect()))
}

/// `POST /api/metrics/ingest`
#[instrument(skip_all, fields(items = req.items.len()))]
async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Json<Vec<IngestOutcome>> {
    Json(ingest_batch(&state.db, req.items).await)
}

/// Parse an optional time-window bound; blank means unbounded.
pub fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(text) => parse_instant_millis(text).map(Some).ok_or_else(|| {
            ApiError::Validation(format!(
                "Invalid {name}: expected an RFC 3339 timestamp or YYYY-MM-DD date"
            ))
        }),
    }
}
