//! Audit log queries.
//!
//! Rows are insert-only. Registry mutations append through
//! [`insert_audit`] on their own transaction so the entry commits or rolls
//! back with the change it describes.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use fleetbook_core::PageRequest;
use fleetbook_core::db::unix_timestamp_millis;
use fleetbook_core::inventory::AuditAction;

use super::db::{DatabaseError, InventoryDatabase};
use super::fold_case;
use super::models::AuditLog;

/// Parameters for appending an audit entry.
pub struct AuditEntry<'a> {
    pub actor: &'a str,
    pub action: AuditAction,
    pub server_id: Option<&'a str>,
    pub payload: &'a serde_json::Value,
}

/// Filters for listing audit entries. Bounds are inclusive epoch millis.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub server_id: Option<String>,
    /// Case-insensitive substring of the actor.
    pub actor: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

pub(super) const AUDIT_SELECT: &str = "SELECT a.id, a.actor, a.action, a.server_id, a.payload, a.created_at, \
     s.id AS linked_server_id, s.name AS linked_server_name \
     FROM audit_logs a LEFT JOIN servers s ON s.id = a.server_id WHERE 1 = 1";

/// Append an entry on an existing connection or transaction.
pub(super) async fn insert_audit(
    conn: &mut SqliteConnection,
    entry: &AuditEntry<'_>,
) -> Result<i64, DatabaseError> {
    let payload = serde_json::to_string(entry.payload)?;

    let result = sqlx::query(
        "INSERT INTO audit_logs (actor, action, server_id, payload, created_at, actor_folded) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.actor)
    .bind(entry.action.as_str())
    .bind(entry.server_id)
    .bind(payload)
    .bind(unix_timestamp_millis())
    .bind(fold_case(entry.actor))
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &AuditFilter) {
    if let Some(server_id) = &filter.server_id {
        qb.push(" AND a.server_id = ").push_bind(server_id.clone());
    }
    if let Some(actor) = &filter.actor {
        qb.push(" AND instr(a.actor_folded, ")
            .push_bind(fold_case(actor))
            .push(") > 0");
    }
    if let Some(from) = filter.from {
        qb.push(" AND a.created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND a.created_at <= ").push_bind(to);
    }
}

impl InventoryDatabase {
    /// Append a standalone audit entry.
    pub async fn append_audit(&self, entry: &AuditEntry<'_>) -> Result<i64, DatabaseError> {
        let mut conn = self.pool().acquire().await?;
        insert_audit(&mut *conn, entry).await
    }

    /// List audit entries, newest first.
    pub async fn list_audit_logs(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> Result<Vec<AuditLog>, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new(AUDIT_SELECT);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY a.created_at DESC, a.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let logs = qb.build_query_as::<AuditLog>().fetch_all(self.pool()).await?;
        Ok(logs)
    }

    /// Count audit entries matching a filter.
    pub async fn count_audit_logs(&self, filter: &AuditFilter) -> Result<i64, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM audit_logs a WHERE 1 = 1");
        push_filters(&mut qb, filter);
        let total = qb.build_query_scalar::<i64>().fetch_one(self.pool()).await?;
        Ok(total)
    }
}
