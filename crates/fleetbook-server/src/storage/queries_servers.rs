//! Server registry queries.
//!
//! Every mutation runs as one transaction covering the server row, its tag
//! set, and the audit entry describing the change.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use fleetbook_core::PageRequest;
use fleetbook_core::db::unix_timestamp_millis;
use fleetbook_core::inventory::{AuditAction, ServerSort};

use super::db::{DatabaseError, InventoryDatabase};
use super::fold_case;
use super::models::{Server, ServerRecord, ServerTag};
use super::queries_audit::{AuditEntry, insert_audit};

/// Tag lookups are split so the `IN (...)` list stays under `SQLite`'s
/// bound-parameter limit.
const TAG_LOOKUP_CHUNK: usize = 500;

/// Parameters for registering a server.
pub struct NewServer<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub ip_address: Option<&'a str>,
    pub environment: &'a str,
    pub os: Option<&'a str>,
    pub role: Option<&'a str>,
    pub location: Option<&'a str>,
    /// JSON object text.
    pub attributes: &'a str,
    pub tags: &'a [String],
}

/// Partial update of a server.
///
/// Outer `None` leaves a column alone; `Some(None)` clears a nullable one.
/// `tags: Some(..)` replaces the whole tag set, even when empty.
#[derive(Default)]
pub struct ServerPatch<'a> {
    pub name: Option<&'a str>,
    pub ip_address: Option<Option<&'a str>>,
    pub environment: Option<&'a str>,
    pub os: Option<Option<&'a str>>,
    pub role: Option<Option<&'a str>>,
    pub location: Option<Option<&'a str>>,
    pub attributes: Option<&'a str>,
    pub tags: Option<&'a [String]>,
}

/// Filters for listing servers.
#[derive(Debug, Clone, Default)]
pub struct ServerFilter {
    /// Case-insensitive substring of name, os, or role.
    pub search: Option<String>,
    pub environment: Option<String>,
    /// Match servers carrying any of these tags.
    pub tags: Vec<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ServerFilter) {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = fold_case(search);
        qb.push(" AND (");
        for (i, column) in ["name_folded", "os_folded", "role_folded"].into_iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("instr(s.{column}, "))
                .push_bind(needle.clone())
                .push(") > 0");
        }
        qb.push(")");
    }
    if let Some(environment) = &filter.environment {
        qb.push(" AND s.environment = ").push_bind(environment.clone());
    }
    if !filter.tags.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM server_tags t WHERE t.server_id = s.id AND t.tag IN (");
        let mut tags = qb.separated(", ");
        for tag in &filter.tags {
            tags.push_bind(tag.clone());
        }
        tags.push_unseparated("))");
    }
}

async fn insert_tags(
    conn: &mut SqliteConnection,
    server_id: &str,
    tags: &[String],
) -> Result<(), DatabaseError> {
    for tag in tags {
        sqlx::query("INSERT OR IGNORE INTO server_tags (server_id, tag) VALUES (?, ?)")
            .bind(server_id)
            .bind(tag)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn fetch_server(conn: &mut SqliteConnection, id: &str) -> Result<Server, DatabaseError> {
    sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Server {id}")))
}

async fn fetch_tags(
    conn: &mut SqliteConnection,
    server_id: &str,
) -> Result<Vec<ServerTag>, DatabaseError> {
    let tags = sqlx::query_as::<_, ServerTag>(
        "SELECT server_id, tag FROM server_tags WHERE server_id = ? ORDER BY tag",
    )
    .bind(server_id)
    .fetch_all(conn)
    .await?;
    Ok(tags)
}

impl InventoryDatabase {
    /// Register a server with its tags, recording a `create` audit entry.
    pub async fn create_server(
        &self,
        server: &NewServer<'_>,
        actor: &str,
        audit_payload: &serde_json::Value,
    ) -> Result<ServerRecord, DatabaseError> {
        let now = unix_timestamp_millis();
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO servers (id, name, ip_address, environment, os, role, location, attributes, created_at, updated_at, \
             name_folded, os_folded, role_folded) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(server.id)
        .bind(server.name)
        .bind(server.ip_address)
        .bind(server.environment)
        .bind(server.os)
        .bind(server.role)
        .bind(server.location)
        .bind(server.attributes)
        .bind(now)
        .bind(now)
        .bind(fold_case(server.name))
        .bind(fold_case(server.os.unwrap_or_default()))
        .bind(fold_case(server.role.unwrap_or_default()))
        .execute(&mut *tx)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Conflict(_) => {
                DatabaseError::Conflict(format!("Server {} already exists", server.id))
            }
            other => other,
        })?;

        insert_tags(&mut tx, server.id, server.tags).await?;

        insert_audit(
            &mut tx,
            &AuditEntry {
                actor,
                action: AuditAction::Create,
                server_id: Some(server.id),
                payload: audit_payload,
            },
        )
        .await?;

        let record = ServerRecord {
            server: fetch_server(&mut tx, server.id).await?,
            tags: fetch_tags(&mut tx, server.id).await?,
        };

        tx.commit().await?;

        Ok(record)
    }

    /// Get a server by ID with its tags.
    pub async fn get_server_record(&self, id: &str) -> Result<ServerRecord, DatabaseError> {
        let mut conn = self.pool().acquire().await?;
        let server = fetch_server(&mut conn, id).await?;
        let tags = fetch_tags(&mut conn, id).await?;
        Ok(ServerRecord { server, tags })
    }

    /// Whether a server with this ID exists.
    pub async fn server_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM servers WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.is_some())
    }

    /// Resolve a server name to an ID. Names are not unique; the earliest
    /// registered server wins.
    pub async fn find_server_id_by_name(&self, name: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM servers WHERE name = ? ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// List servers matching a filter, with their tags.
    pub async fn list_servers(
        &self,
        filter: &ServerFilter,
        sort: &ServerSort,
        page: &PageRequest,
    ) -> Result<Vec<ServerRecord>, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT s.* FROM servers s WHERE 1 = 1");
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let servers = qb.build_query_as::<Server>().fetch_all(self.pool()).await?;

        let ids: Vec<&str> = servers.iter().map(|s| s.id.as_str()).collect();
        let mut tags = self.tags_for(&ids).await?;

        Ok(servers
            .into_iter()
            .map(|server| {
                let tags = tags.remove(&server.id).unwrap_or_default();
                ServerRecord { server, tags }
            })
            .collect())
    }

    /// Count servers matching a filter.
    pub async fn count_servers(&self, filter: &ServerFilter) -> Result<i64, DatabaseError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM servers s WHERE 1 = 1");
        push_filters(&mut qb, filter);
        let total = qb.build_query_scalar::<i64>().fetch_one(self.pool()).await?;
        Ok(total)
    }

    /// Tags for a set of servers, keyed by server ID.
    pub async fn tags_for(
        &self,
        server_ids: &[&str],
    ) -> Result<HashMap<String, Vec<ServerTag>>, DatabaseError> {
        let mut by_server: HashMap<String, Vec<ServerTag>> = HashMap::new();

        for chunk in server_ids.chunks(TAG_LOOKUP_CHUNK) {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT server_id, tag FROM server_tags WHERE server_id IN (",
            );
            let mut ids = qb.separated(", ");
            for id in chunk {
                ids.push_bind((*id).to_string());
            }
            ids.push_unseparated(") ORDER BY server_id, tag");

            let rows = qb.build_query_as::<ServerTag>().fetch_all(self.pool()).await?;
            for row in rows {
                by_server.entry(row.server_id.clone()).or_default().push(row);
            }
        }

        Ok(by_server)
    }

    /// Patch a server, recording an `update` audit entry.
    pub async fn update_server(
        &self,
        id: &str,
        patch: &ServerPatch<'_>,
        actor: &str,
        audit_payload: &serde_json::Value,
    ) -> Result<ServerRecord, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let existing = fetch_server(&mut tx, id).await?;

        let name = patch.name.unwrap_or(&existing.name);
        let ip_address = patch.ip_address.unwrap_or(existing.ip_address.as_deref());
        let environment = patch.environment.unwrap_or(&existing.environment);
        let os = patch.os.unwrap_or(existing.os.as_deref());
        let role = patch.role.unwrap_or(existing.role.as_deref());
        let location = patch.location.unwrap_or(existing.location.as_deref());
        let attributes = patch.attributes.unwrap_or(&existing.attributes);

        sqlx::query(
            "UPDATE servers SET name = ?, ip_address = ?, environment = ?, os = ?, role = ?, location = ?, attributes = ?, updated_at = ?, \
             name_folded = ?, os_folded = ?, role_folded = ? WHERE id = ?",
        )
        .bind(name)
        .bind(ip_address)
        .bind(environment)
        .bind(os)
        .bind(role)
        .bind(location)
        .bind(attributes)
        .bind(unix_timestamp_millis().max(existing.updated_at))
        .bind(fold_case(name))
        .bind(fold_case(os.unwrap_or_default()))
        .bind(fold_case(role.unwrap_or_default()))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(tags) = patch.tags {
            sqlx::query("DELETE FROM server_tags WHERE server_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_tags(&mut tx, id, tags).await?;
        }

        insert_audit(
            &mut tx,
            &AuditEntry {
                actor,
                action: AuditAction::Update,
                server_id: Some(id),
                payload: audit_payload,
            },
        )
        .await?;

        let record = ServerRecord {
            server: fetch_server(&mut tx, id).await?,
            tags: fetch_tags(&mut tx, id).await?,
        };

        tx.commit().await?;

        Ok(record)
    }

    /// Delete a server (tags and metrics cascade), recording a `delete`
    /// audit entry. Returns the server as it was before deletion.
    pub async fn remove_server(
        &self,
        id: &str,
        actor: &str,
    ) -> Result<ServerRecord, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let record = ServerRecord {
            server: fetch_server(&mut tx, id).await?,
            tags: fetch_tags(&mut tx, id).await?,
        };

        sqlx::query("DELETE FROM servers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_audit(
            &mut tx,
            &AuditEntry {
                actor,
                action: AuditAction::Delete,
                server_id: Some(id),
                payload: &serde_json::json!({}),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(record)
    }
}
