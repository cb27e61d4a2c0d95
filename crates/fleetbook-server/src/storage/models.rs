//! Data models for Fleetbook storage.

use serde::{Deserialize, Serialize};

use fleetbook_core::inventory::{FieldRule, FieldType};

use super::db::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub ip_address: Option<String>,
    pub environment: String,
    pub os: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    /// JSON object text.
    pub attributes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServerTag {
    pub server_id: String,
    pub tag: String,
}

/// A server together with the tags it owns.
#[derive(Debug, Clone)]
pub struct ServerRecord {
    pub server: Server,
    pub tags: Vec<ServerTag>,
}

impl ServerRecord {
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.tag.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServerField {
    pub id: i64,
    pub field_key: String,
    pub label: String,
    pub field_type: String,
    pub unit: Option<String>,
    /// JSON text.
    pub options: Option<String>,
    pub required: bool,
    pub group_name: Option<String>,
    pub order_index: i64,
    pub visible: bool,
    /// JSON text.
    pub default_value: Option<String>,
}

impl ServerField {
    /// Read this catalog entry as a validation rule for attribute bags.
    pub fn rule(&self) -> Result<FieldRule, DatabaseError> {
        let field_type: FieldType = self
            .field_type
            .parse()
            .map_err(|e: String| DatabaseError::Invalid(format!("Field {}: {e}", self.field_key)))?;
        let options = match &self.options {
            Some(text) => serde_json::from_str(text)?,
            None => serde_json::Value::Null,
        };
        Ok(FieldRule {
            key: self.field_key.clone(),
            field_type,
            options,
            required: self.required,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Metric {
    pub id: i64,
    pub server_id: String,
    pub metric: String,
    pub ts: i64,
    pub value: f64,
}

/// Most recent observation of one series.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LatestMetric {
    pub metric: String,
    pub ts: i64,
    pub value: f64,
}

/// Audit row joined with the server it names, when that server still exists.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub server_id: Option<String>,
    /// JSON text.
    pub payload: String,
    pub created_at: i64,
    pub linked_server_id: Option<String>,
    pub linked_server_name: Option<String>,
}
