//! Batch metric ingestion.
//!
//! Each item is resolved and stored on its own; a bad item produces a
//! rejected outcome and the rest of the batch carries on.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{info, warn};

use fleetbook_core::db::unix_timestamp_millis;
use fleetbook_core::time::parse_instant_millis;

use super::server_routes::canonical_server_id;
use crate::storage::{DatabaseError, InventoryDatabase};

/// Reason given when an item names no existing server.
pub const SERVER_NOT_FOUND: &str = "Server not found";

/// One raw observation as posted by collectors.
#[derive(Debug, Deserialize)]
struct IngestItem {
    server_id: Option<String>,
    server_name: Option<String>,
    metric: Option<String>,
    ts: Option<IngestTimestamp>,
    value: Option<f64>,
}

/// Collectors send either epoch millis or a date string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngestTimestamp {
    Millis(i64),
    Text(String),
}

impl IngestTimestamp {
    fn millis(&self) -> Result<i64, String> {
        match self {
            Self::Millis(ms) => Ok(*ms),
            Self::Text(text) => {
                parse_instant_millis(text).ok_or_else(|| format!("Invalid ts: {text:?}"))
            }
        }
    }
}

/// Result for one item of a batch, in input order.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Stored,
    Rejected { error: String, item: Value },
}

impl IngestOutcome {
    pub const fn is_stored(&self) -> bool {
        matches!(self, Self::Stored)
    }
}

impl Serialize for IngestOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Stored => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("success", &true)?;
                map.end()
            }
            Self::Rejected { error, item } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("item", item)?;
                map.end()
            }
        }
    }
}

/// Store every item that can be stored. Never fails as a whole.
pub async fn ingest_batch(db: &InventoryDatabase, items: Vec<Value>) -> Vec<IngestOutcome> {
    let mut outcomes = Vec::with_capacity(items.len());

    for raw in items {
        match ingest_one(db, &raw).await {
            Ok(()) => outcomes.push(IngestOutcome::Stored),
            Err(error) => outcomes.push(IngestOutcome::Rejected { error, item: raw }),
        }
    }

    let stored = outcomes.iter().filter(|o| o.is_stored()).count();
    let rejected = outcomes.len() - stored;
    if rejected > 0 {
        warn!(stored, rejected, "Metric batch partially rejected");
    } else {
        info!(stored, "Metric batch ingested");
    }

    outcomes
}

async fn ingest_one(db: &InventoryDatabase, raw: &Value) -> Result<(), String> {
    if !raw.is_object() {
        return Err("Item must be an object".to_string());
    }
    let item: IngestItem =
        serde_json::from_value(raw.clone()).map_err(|e| format!("Malformed item: {e}"))?;

    let server_id = resolve_server(db, &item)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| SERVER_NOT_FOUND.to_string())?;

    let metric = item
        .metric
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or("metric is required")?;
    let value = item.value.ok_or("value is required")?;
    let ts = match &item.ts {
        Some(ts) => ts.millis()?,
        None => unix_timestamp_millis(),
    };

    db.insert_metric(&server_id, metric, ts, value)
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// `server_id` wins when present, and must name an existing server.
async fn resolve_server(
    db: &InventoryDatabase,
    item: &IngestItem,
) -> Result<Option<String>, DatabaseError> {
    if let Some(raw) = item.server_id.as_deref().filter(|s| !s.is_empty()) {
        let id = canonical_server_id(raw);
        return Ok(db.server_exists(&id).await?.then_some(id));
    }
    match item.server_name.as_deref().filter(|s| !s.is_empty()) {
        Some(name) => db.find_server_id_by_name(name).await,
        None => Ok(None),
    }
}
