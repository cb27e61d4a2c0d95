//! Sample inventory for demos and local development.
//!
//! Seeding is repeatable. Catalog entries are upserted by key and servers
//! are only created when their id is free; every run appends one fresh
//! observation per sample series.

use serde_json::json;
use tracing::info;

use fleetbook_core::db::unix_timestamp_millis;
use fleetbook_core::inventory::FieldType;

use crate::storage::{DatabaseError, FieldPatch, InventoryDatabase, NewServer, NewServerField};

/// Actor recorded on the audit entries of seeded servers.
pub const SEED_ACTOR: &str = "seed";

pub const SAMPLE_APP_SERVER: &str = "00000000-0000-0000-0000-000000000001";
pub const SAMPLE_DB_SERVER: &str = "00000000-0000-0000-0000-000000000002";

/// What one seeding run changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub fields_created: usize,
    pub fields_updated: usize,
    pub servers_created: usize,
    pub metrics_inserted: usize,
}

const fn field(
    key: &'static str,
    label: &'static str,
    field_type: FieldType,
    group: &'static str,
    order_index: i64,
) -> NewServerField<'static> {
    NewServerField {
        key,
        label,
        field_type,
        unit: None,
        options: None,
        required: false,
        group: Some(group),
        order_index,
        visible: true,
        default_value: None,
    }
}

fn sample_fields() -> [NewServerField<'static>; 5] {
    [
        field("owner_dept", "Owning department", FieldType::String, "Asset", 10),
        NewServerField {
            options: Some(r#"{"values":["Daily","Weekly","Monthly","None"]}"#),
            ..field("backup_policy", "Backup policy", FieldType::Enum, "Operations", 20)
        },
        field("maintenance_expiry", "Maintenance expiry", FieldType::Date, "Asset", 30),
        NewServerField {
            unit: Some("cores"),
            ..field("cpu_cores", "CPU cores", FieldType::Number, "Hardware", 40)
        },
        NewServerField {
            unit: Some("GB"),
            ..field("memory_gb", "Memory", FieldType::Number, "Hardware", 50)
        },
    ]
}

struct SampleServer {
    id: &'static str,
    name: &'static str,
    ip_address: &'static str,
    os: &'static str,
    role: &'static str,
    location: &'static str,
    attributes: serde_json::Value,
    tags: [&'static str; 2],
    metrics: [(&'static str, f64); 2],
}

fn sample_servers() -> [SampleServer; 2] {
    [
        SampleServer {
            id: SAMPLE_APP_SERVER,
            name: "srv-app-001",
            ip_address: "10.20.30.40",
            os: "Windows Server 2022",
            role: "Application",
            location: "DC-1 Rack-12",
            attributes: json!({
                "owner_dept": "IT Operations",
                "backup_policy": "Daily",
                "maintenance_expiry": "2026-03-31",
                "cpu_cores": 8,
                "memory_gb": 32,
            }),
            tags: ["primera", "etl"],
            metrics: [("memory_used_percent", 63.4), ("disk_free_tb", 0.142)],
        },
        SampleServer {
            id: SAMPLE_DB_SERVER,
            name: "srv-db-001",
            ip_address: "10.20.30.41",
            os: "Red Hat Enterprise Linux 9",
            role: "Database",
            location: "DC-1 Rack-13",
            attributes: json!({
                "owner_dept": "Database",
                "backup_policy": "Daily",
                "maintenance_expiry": "2027-12-31",
                "cpu_cores": 16,
                "memory_gb": 128,
            }),
            tags: ["postgresql", "production"],
            metrics: [("memory_used_percent", 78.2), ("disk_free_tb", 2.5)],
        },
    ]
}

/// Load the sample catalog, servers, and metrics.
pub async fn seed_sample_data(db: &InventoryDatabase) -> Result<SeedSummary, DatabaseError> {
    let mut summary = SeedSummary::default();

    let existing = db.list_server_fields().await?;
    for field in sample_fields() {
        match existing.iter().find(|f| f.field_key == field.key) {
            Some(current) => {
                db.update_server_field(current.id, &refresh_patch(&field))
                    .await?;
                summary.fields_updated += 1;
            }
            None => {
                db.create_server_field(&field).await?;
                summary.fields_created += 1;
            }
        }
    }

    let now = unix_timestamp_millis();
    for sample in sample_servers() {
        if !db.server_exists(sample.id).await? {
            let tags: Vec<String> = sample.tags.iter().map(ToString::to_string).collect();
            db.create_server(
                &NewServer {
                    id: sample.id,
                    name: sample.name,
                    ip_address: Some(sample.ip_address),
                    environment: "prod",
                    os: Some(sample.os),
                    role: Some(sample.role),
                    location: Some(sample.location),
                    attributes: &sample.attributes.to_string(),
                    tags: &tags,
                },
                SEED_ACTOR,
                &json!({ "seed": true }),
            )
            .await?;
            summary.servers_created += 1;
        }

        for (metric, value) in sample.metrics {
            db.insert_metric(sample.id, metric, now, value).await?;
            summary.metrics_inserted += 1;
        }
    }

    info!(
        fields_created = summary.fields_created,
        fields_updated = summary.fields_updated,
        servers_created = summary.servers_created,
        metrics_inserted = summary.metrics_inserted,
        "Sample data seeded"
    );
    Ok(summary)
}

/// Overwrite a catalog entry with the sample definition.
fn refresh_patch<'a>(field: &NewServerField<'a>) -> FieldPatch<'a> {
    FieldPatch {
        key: None,
        label: Some(field.label),
        field_type: Some(field.field_type),
        unit: Some(field.unit),
        options: Some(field.options),
        required: Some(field.required),
        group: Some(field.group),
        order_index: Some(field.order_index),
        visible: Some(field.visible),
        default_value: Some(field.default_value),
    }
}
