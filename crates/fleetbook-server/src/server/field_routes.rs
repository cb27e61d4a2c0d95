//! Field catalog routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use fleetbook_core::inventory::FieldType;

use super::AppState;
use super::error::ApiError;
use super::patch::double_option;
use super::views::FieldView;
use crate::storage::{FieldPatch, NewServerField};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFieldRequest {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub unit: Option<String>,
    pub options: Option<Value>,
    #[serde(default)]
    pub required: bool,
    pub group: Option<String>,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    pub default_value: Option<Value>,
}

const fn visible_by_default() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldRequest {
    pub key: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub options: Option<Option<Value>>,
    pub required: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub group: Option<Option<String>>,
    pub order_index: Option<i64>,
    pub visible: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_value: Option<Option<Value>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/server-fields", get(list_fields).post(create_field))
        .route(
            "/api/server-fields/{id}",
            get(get_field).patch(update_field).delete(delete_field),
        )
}

/// `GET /api/server-fields`
async fn list_fields(State(state): State<AppState>) -> Result<Json<Vec<FieldView>>, ApiError> {
    let fields = state
        .db
        .list_server_fields()
        .await?
        .into_iter()
        .map(FieldView::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(fields))
}

/// `GET /api/server-fields/{id}`
async fn get_field(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FieldView>, ApiError> {
    let field = state.db.get_server_field(parse_field_id(&id)?).await?;
    Ok(Json(FieldView::try_from(field)?))
}

/// `POST /api/server-fields`
#[instrument(skip_all, fields(key = %req.key))]
async fn create_field(
    State(state): State<AppState>,
    Json(req): Json<CreateFieldRequest>,
) -> Result<(StatusCode, Json<FieldView>), ApiError> {
    let key = required("key", &req.key)?;
    let label = required("label", &req.label)?;
    let options = encode_json(req.options.as_ref());
    let default_value = encode_json(req.default_value.as_ref());

    let field = state
        .db
        .create_server_field(&NewServerField {
            key,
            label,
            field_type: req.field_type,
            unit: req.unit.as_deref(),
            options: options.as_deref(),
            required: req.required,
            group: req.group.as_deref(),
            order_index: req.order_index,
            visible: req.visible,
            default_value: default_value.as_deref(),
        })
        .await?;

    info!(field_id = field.id, "Server field created");
    Ok((StatusCode::CREATED, Json(FieldView::try_from(field)?)))
}

/// `PATCH /api/server-fields/{id}`
#[instrument(skip(state, req))]
async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFieldRequest>,
) -> Result<Json<FieldView>, ApiError> {
    let field_id = parse_field_id(&id)?;
    let key = req.key.as_deref().map(|k| required("key", k)).transpose()?;
    let label = req
        .label
        .as_deref()
        .map(|l| required("label", l))
        .transpose()?;
    let options = req.options.as_ref().map(|o| encode_json(o.as_ref()));
    let default_value = req.default_value.as_ref().map(|d| encode_json(d.as_ref()));

    let patch = FieldPatch {
        key,
        label,
        field_type: req.field_type,
        unit: req.unit.as_ref().map(Option::as_deref),
        options: options.as_ref().map(Option::as_deref),
        required: req.required,
        group: req.group.as_ref().map(Option::as_deref),
        order_index: req.order_index,
        visible: req.visible,
        default_value: default_value.as_ref().map(Option::as_deref),
    };

    let field = state.db.update_server_field(field_id, &patch).await?;
    info!(field_id, "Server field updated");
    Ok(Json(FieldView::try_from(field)?))
}

/// `DELETE /api/server-fields/{id}`; returns the removed entry.
#[instrument(skip(state))]
async fn delete_field(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FieldView>, ApiError> {
    let field_id = parse_field_id(&id)?;
    let field = state.db.remove_server_field(field_id).await?;
    info!(field_id, "Server field deleted");
    Ok(Json(FieldView::try_from(field)?))
}

fn parse_field_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("Field id must be an integer, got {raw:?}")))
}

fn required<'a>(what: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("Field {what} must not be empty")));
    }
    Ok(trimmed)
}

/// JSON `null` is stored as SQL `NULL`.
fn encode_json(value: Option<&Value>) -> Option<String> {
    value.filter(|v| !v.is_null()).map(Value::to_string)
}
