//! Metric queries.

use super::db::{DatabaseError, InventoryDatabase};
use super::models::{LatestMetric, Metric};

impl InventoryDatabase {
    /// Record one observation.
    pub async fn insert_metric(
        &self,
        server_id: &str,
        metric: &str,
        ts: i64,
        value: f64,
    ) -> Result<i64, DatabaseError> {
        let result =
            sqlx::query("INSERT INTO metrics (server_id, metric, ts, value) VALUES (?, ?, ?, ?)")
                .bind(server_id)
                .bind(metric)
                .bind(ts)
                .bind(value)
                .execute(self.pool())
                .await?;

        Ok(result.last_insert_rowid())
    }

    /// Latest observation of every series recorded for a server, ordered by
    /// metric name. Equal timestamps resolve to the most recently inserted row.
    pub async fn latest_metrics(&self, server_id: &str) -> Result<Vec<LatestMetric>, DatabaseError> {
        let rows = sqlx::query_as::<_, LatestMetric>(
            "SELECT metric, ts, value FROM ( \
                 SELECT metric, ts, value, \
                        ROW_NUMBER() OVER (PARTITION BY metric ORDER BY ts DESC, id DESC) AS rn \
                 FROM metrics WHERE server_id = ? \
             ) WHERE rn = 1 ORDER BY metric ASC",
        )
        .bind(server_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Observations of one series in `[from, to]` (inclusive, either bound
    /// optional), oldest first.
    pub async fn metric_history(
        &self,
        server_id: &str,
        metric: &str,
        from: Option<i64>,
        to: Option<i64>,
    ) -> Result<Vec<Metric>, DatabaseError> {
        let rows = sqlx::query_as::<_, Metric>(
            "SELECT * FROM metrics \
             WHERE server_id = ? AND metric = ? AND ts >= COALESCE(?, ts) AND ts <= COALESCE(?, ts) \
             ORDER BY ts ASC, id ASC",
        )
        .bind(server_id)
        .bind(metric)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Most recent observations across all series of a server, newest first.
    pub async fn recent_metrics(
        &self,
        server_id: &str,
        limit: u32,
    ) -> Result<Vec<Metric>, DatabaseError> {
        let rows = sqlx::query_as::<_, Metric>(
            "SELECT * FROM metrics WHERE server_id = ? ORDER BY ts DESC, id DESC LIMIT ?",
        )
        .bind(server_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
