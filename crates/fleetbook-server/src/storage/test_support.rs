//! Lookups only the test suites need.

use sqlx::{QueryBuilder, Sqlite};

use super::db::{DatabaseError, InventoryDatabase};
use super::models::AuditLog;
use super::queries_audit::AUDIT_SELECT;

impl InventoryDatabase {
    pub(crate) async fn get_audit_log(&self, id: i64) -> Result<AuditLog, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new(AUDIT_SELECT);
        qb.push(" AND a.id = ").push_bind(id);
        qb.build_query_as::<AuditLog>()
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Audit log {id}")))
    }

    pub(crate) async fn count_metrics(&self, server_id: &str) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM metrics WHERE server_id = ?")
            .bind(server_id)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
