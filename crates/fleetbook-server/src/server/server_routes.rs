//! Server registry routes.

use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use fleetbook_core::PageRequest;
use fleetbook_core::inventory::attributes::validate_attributes;
use fleetbook_core::inventory::{Environment, FieldRule, ServerSort};

use super::AppState;
use super::error::ApiError;
use super::patch::{clean_tags, double_option};
use super::views::{ServerListResponse, ServerView};
use crate::auth::Claims;
use crate::storage::{InventoryDatabase, NewServer, ServerFilter, ServerPatch};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListServersQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    pub env: Option<String>,
    /// Comma-separated.
    pub tags: Option<String>,
    /// `field:direction`.
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServerRequest {
    pub id: Option<String>,
    pub name: String,
    pub ip_address: Option<String>,
    #[serde(default)]
    pub environment: Environment,
    pub os: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServerRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub ip_address: Option<Option<String>>,
    pub environment: Option<Environment>,
    #[serde(default, deserialize_with = "double_option")]
    pub os: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub attributes: Option<Map<String, Value>>,
    /// Present (even empty) replaces every tag.
    pub tags: Option<Vec<String>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/servers", get(list_servers).post(create_server))
        .route(
            "/api/servers/{id}",
            get(get_server).patch(update_server).delete(delete_server),
        )
}

/// Parse the registry's list query into storage terms.
fn list_params(
    query: &ListServersQuery,
    default_per_page: u32,
) -> Result<(ServerFilter, ServerSort, PageRequest), ApiError> {
    let environment = match query.env.as_deref().filter(|e| !e.is_empty()) {
        Some(env) => Some(
            env.parse::<Environment>()
                .map_err(ApiError::Validation)?
                .as_str()
                .to_string(),
        ),
        None => None,
    };

    let tags = query
        .tags
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    let sort = match query.sort.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<ServerSort>().map_err(ApiError::Validation)?,
        None => ServerSort::default(),
    };

    let filter = ServerFilter {
        search: query.search.clone().filter(|s| !s.is_empty()),
        environment,
        tags,
    };
    let page = PageRequest::from_query(
        query.page.as_deref(),
        query.per_page.as_deref(),
        default_per_page,
    );

    Ok((filter, sort, page))
}

/// `GET /api/servers`
#[instrument(skip(state))]
async fn list_servers(
    State(state): State<AppState>,
    Query(query): Query<ListServersQuery>,
) -> Result<Json<ServerListResponse>, ApiError> {
    let (filter, sort, page) = list_params(&query, state.registry.default_per_page)?;

    let total = state.db.count_servers(&filter).await?;
    let records = state.db.list_servers(&filter, &sort, &page).await?;
    let servers = records
        .into_iter()
        .map(ServerView::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ServerListResponse {
        servers,
        page: page.envelope(total),
    }))
}

/// `GET /api/servers/{id}` with the most recent metrics embedded.
#[instrument(skip(state))]
async fn get_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServerView>, ApiError> {
    let id = canonical_server_id(&id);
    let record = state.db.get_server_record(&id).await?;
    let metrics = state
        .db
        .recent_metrics(&id, state.registry.max_recent_metrics)
        .await?;
    Ok(Json(ServerView::try_from(record)?.with_metrics(metrics)))
}

/// `POST /api/servers`
#[instrument(skip_all, fields(actor = %claims.username))]
async fn create_server(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ServerView>), ApiError> {
    let req: CreateServerRequest = serde_json::from_value(body.clone())
        .map_err(|e| ApiError::Validation(format!("Invalid server: {e}")))?;

    let name = required_name(&req.name)?;
    let id = match req.id.as_deref() {
        Some(raw) => parse_server_id(raw)?,
        None => uuid::Uuid::new_v4().to_string(),
    };

    enforce_schema(&state, &req.attributes, true).await?;

    let attributes = Value::Object(req.attributes).to_string();
    let tags = clean_tags(&req.tags);

    let record = state
        .db
        .create_server(
            &NewServer {
                id: &id,
                name,
                ip_address: req.ip_address.as_deref(),
                environment: req.environment.as_str(),
                os: req.os.as_deref(),
                role: req.role.as_deref(),
                location: req.location.as_deref(),
                attributes: &attributes,
                tags: &tags,
            },
            &claims.username,
            &json!({ "server": body }),
        )
        .await?;

    info!(server_id = %id, "Server created");
    Ok((StatusCode::CREATED, Json(ServerView::try_from(record)?)))
}

/// `PATCH /api/servers/{id}`
#[instrument(skip(state, claims, body), fields(actor = %claims.username))]
async fn update_server(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ServerView>, ApiError> {
    let id = canonical_server_id(&id);
    let req: UpdateServerRequest = serde_json::from_value(body.clone())
        .map_err(|e| ApiError::Validation(format!("Invalid server update: {e}")))?;

    let name = req.name.as_deref().map(required_name).transpose()?;

    if let Some(attributes) = &req.attributes {
        enforce_schema(&state, attributes, false).await?;
    }

    let attributes = req
        .attributes
        .map(|attrs| Value::Object(attrs).to_string());
    let tags = req.tags.as_deref().map(clean_tags);

    let patch = ServerPatch {
        name,
        ip_address: req.ip_address.as_ref().map(Option::as_deref),
        environment: req.environment.map(|e| e.as_str()),
        os: req.os.as_ref().map(Option::as_deref),
        role: req.role.as_ref().map(Option::as_deref),
        location: req.location.as_ref().map(Option::as_deref),
        attributes: attributes.as_deref(),
        tags: tags.as_deref(),
    };

    let record = state
        .db
        .update_server(&id, &patch, &claims.username, &json!({ "changes": body }))
        .await?;

    info!(server_id = %id, "Server updated");
    Ok(Json(ServerView::try_from(record)?))
}

/// `DELETE /api/servers/{id}`; returns the deleted server.
#[instrument(skip(state, claims), fields(actor = %claims.username))]
async fn delete_server(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ServerView>, ApiError> {
    let id = canonical_server_id(&id);
    let record = state.db.remove_server(&id, &claims.username).await?;
    info!(server_id = %id, "Server deleted");
    Ok(Json(ServerView::try_from(record)?))
}

fn required_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("Server name must not be empty".into()));
    }
    Ok(trimmed)
}

fn parse_server_id(raw: &str) -> Result<String, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| ApiError::Validation(format!("Server id must be a UUID, got {raw:?}")))
}

/// Stored ids are lowercase hyphenated UUIDs; any UUID spelling maps onto
/// that form. Other strings are left as-is and simply match nothing.
pub(crate) fn canonical_server_id(raw: &str) -> String {
    uuid::Uuid::parse_str(raw).map_or_else(|_| raw.to_string(), |id| id.to_string())
}

/// Check an attribute bag against the catalog when enforcement is on.
async fn enforce_schema(
    state: &AppState,
    attributes: &Map<String, Value>,
    check_required: bool,
) -> Result<(), ApiError> {
    if !state.registry.enforce_attribute_schema {
        return Ok(());
    }
    let rules = catalog_rules(&state.db).await?;
    validate_attributes(&rules, attributes, check_required).map_err(|v| ApiError::attributes(&v))
}

/// Catalog entries as validation rules.
async fn catalog_rules(db: &InventoryDatabase) -> Result<Vec<FieldRule>, ApiError> {
    let fields = db.list_server_fields().await?;
    fields
        .iter()
        .map(|f| f.rule().map_err(ApiError::from))
        .collect()
}
