//! Wire representations of stored rows.
//!
//! Storage keeps JSON columns as text and timestamps as epoch millis; the
//! views decode both so responses carry real JSON and RFC 3339 instants.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use fleetbook_core::pagination::PageInfo;
use fleetbook_core::time::from_millis;

use crate::storage::{
    AuditLog, DatabaseError, LatestMetric, Metric, ServerField, ServerRecord, ServerTag,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagView {
    pub server_id: String,
    pub tag: String,
}

impl From<ServerTag> for TagView {
    fn from(t: ServerTag) -> Self {
        Self {
            server_id: t.server_id,
            tag: t.tag,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerView {
    pub id: String,
    pub name: String,
    pub ip_address: Option<String>,
    pub environment: String,
    pub os: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    pub attributes: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<TagView>,
    /// Only present on single-server reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<MetricView>>,
}

impl TryFrom<ServerRecord> for ServerView {
    type Error = DatabaseError;

    fn try_from(record: ServerRecord) -> Result<Self, Self::Error> {
        let ServerRecord { server, tags } = record;
        Ok(Self {
            attributes: serde_json::from_str(&server.attributes)?,
            id: server.id,
            name: server.name,
            ip_address: server.ip_address,
            environment: server.environment,
            os: server.os,
            role: server.role,
            location: server.location,
            created_at: from_millis(server.created_at),
            updated_at: from_millis(server.updated_at),
            tags: tags.into_iter().map(TagView::from).collect(),
            metrics: None,
        })
    }
}

impl ServerView {
    #[must_use]
    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = Some(metrics.into_iter().map(MetricView::from).collect());
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ServerListResponse {
    pub servers: Vec<ServerView>,
    #[serde(flatten)]
    pub page: PageInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub id: i64,
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub unit: Option<String>,
    pub options: Option<Value>,
    pub required: bool,
    pub group: Option<String>,
    pub order_index: i64,
    pub visible: bool,
    pub default_value: Option<Value>,
}

impl TryFrom<ServerField> for FieldView {
    type Error = DatabaseError;

    fn try_from(f: ServerField) -> Result<Self, Self::Error> {
        Ok(Self {
            options: decode_optional(f.options.as_deref())?,
            default_value: decode_optional(f.default_value.as_deref())?,
            id: f.id,
            key: f.field_key,
            label: f.label,
            field_type: f.field_type,
            unit: f.unit,
            required: f.required,
            group: f.group_name,
            order_index: f.order_index,
            visible: f.visible,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricView {
    pub id: i64,
    pub server_id: String,
    pub metric: String,
    pub ts: DateTime<Utc>,
    pub value: f64,
}

impl From<Metric> for MetricView {
    fn from(m: Metric) -> Self {
        Self {
            id: m.id,
            server_id: m.server_id,
            metric: m.metric,
            ts: from_millis(m.ts),
            value: m.value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LatestMetricView {
    pub metric: String,
    pub ts: DateTime<Utc>,
    pub value: f64,
}

impl From<LatestMetric> for LatestMetricView {
    fn from(m: LatestMetric) -> Self {
        Self {
            metric: m.metric,
            ts: from_millis(m.ts),
            value: m.value,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkedServer {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogView {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub server_id: Option<String>,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    /// `null` once the server has been deleted.
    pub server: Option<LinkedServer>,
}

impl TryFrom<AuditLog> for AuditLogView {
    type Error = DatabaseError;

    fn try_from(log: AuditLog) -> Result<Self, Self::Error> {
        let server = match (log.linked_server_id, log.linked_server_name) {
            (Some(id), Some(name)) => Some(LinkedServer { id, name }),
            _ => None,
        };
        Ok(Self {
            payload: serde_json::from_str(&log.payload)?,
            id: log.id,
            actor: log.actor,
            action: log.action,
            server_id: log.server_id,
            created_at: from_millis(log.created_at),
            server,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub logs: Vec<AuditLogView>,
    #[serde(flatten)]
    pub page: PageInfo,
}

fn decode_optional(text: Option<&str>) -> Result<Option<Value>, DatabaseError> {
    text.map(serde_json::from_str).transpose().map_err(Into::into)
}
