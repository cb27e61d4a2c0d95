//! Audit log routes. Read-only; entries are written by registry mutations.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;

use fleetbook_core::PageRequest;

use super::AppState;
use super::error::ApiError;
use super::metric_routes::parse_bound;
use super::server_routes::canonical_server_id;
use super::views::{AuditListResponse, AuditLogView};
use crate::storage::AuditFilter;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub server_id: Option<String>,
    pub actor: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/audit", get(list_audit))
}

/// `GET /api/audit`, newest first.
#[instrument(skip(state))]
async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditListResponse>, ApiError> {
    let filter = AuditFilter {
        server_id: query
            .server_id
            .filter(|s| !s.is_empty())
            .map(|id| canonical_server_id(&id)),
        actor: query.actor.filter(|s| !s.is_empty()),
        from: parse_bound("from", query.from.as_deref())?,
        to: parse_bound("to", query.to.as_deref())?,
    };
    let page = PageRequest::from_query(
        query.page.as_deref(),
        query.per_page.as_deref(),
        state.registry.default_per_page,
    );

    let total = state.db.count_audit_logs(&filter).await?;
    let logs = state
        .db
        .list_audit_logs(&filter, &page)
        .await?
        .into_iter()
        .map(AuditLogView::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(AuditListResponse {
        logs,
        page: page.envelope(total),
    }))
}
