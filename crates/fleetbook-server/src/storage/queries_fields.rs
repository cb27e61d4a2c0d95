//! Field catalog queries.

use fleetbook_core::inventory::FieldType;

use super::db::{DatabaseError, InventoryDatabase};
use super::models::ServerField;

/// Parameters for creating a catalog entry. JSON payloads are passed as text.
pub struct NewServerField<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub field_type: FieldType,
    pub unit: Option<&'a str>,
    pub options: Option<&'a str>,
    pub required: bool,
    pub group: Option<&'a str>,
    pub order_index: i64,
    pub visible: bool,
    pub default_value: Option<&'a str>,
}

/// Partial update of a catalog entry.
///
/// Outer `None` leaves a column alone; `Some(None)` clears a nullable one.
#[derive(Default)]
pub struct FieldPatch<'a> {
    pub key: Option<&'a str>,
    pub label: Option<&'a str>,
    pub field_type: Option<FieldType>,
    pub unit: Option<Option<&'a str>>,
    pub options: Option<Option<&'a str>>,
    pub required: Option<bool>,
    pub group: Option<Option<&'a str>>,
    pub order_index: Option<i64>,
    pub visible: Option<bool>,
    pub default_value: Option<Option<&'a str>>,
}

fn key_conflict(key: &str) -> impl FnOnce(sqlx::Error) -> DatabaseError + '_ {
    move |e| match DatabaseError::from(e) {
        DatabaseError::Conflict(_) => {
            DatabaseError::Conflict(format!("Server field with key {key} already exists"))
        }
        other => other,
    }
}

impl InventoryDatabase {
    /// List the catalog in display order.
    pub async fn list_server_fields(&self) -> Result<Vec<ServerField>, DatabaseError> {
        let fields = sqlx::query_as::<_, ServerField>(
            "SELECT * FROM server_fields ORDER BY order_index ASC, id ASC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(fields)
    }

    /// Get a catalog entry by ID.
    pub async fn get_server_field(&self, id: i64) -> Result<ServerField, DatabaseError> {
        sqlx::query_as::<_, ServerField>("SELECT * FROM server_fields WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Server field {id}")))
    }

    /// Create a catalog entry. Fails with `Conflict` when the key is taken.
    pub async fn create_server_field(
        &self,
        field: &NewServerField<'_>,
    ) -> Result<ServerField, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO server_fields (field_key, label, field_type, unit, options, required, group_name, order_index, visible, default_value) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(field.key)
        .bind(field.label)
        .bind(field.field_type.as_str())
        .bind(field.unit)
        .bind(field.options)
        .bind(field.required)
        .bind(field.group)
        .bind(field.order_index)
        .bind(field.visible)
        .bind(field.default_value)
        .execute(self.pool())
        .await
        .map_err(key_conflict(field.key))?;

        self.get_server_field(result.last_insert_rowid()).await
    }

    /// Patch a catalog entry. Existing server attributes are not revisited.
    pub async fn update_server_field(
        &self,
        id: i64,
        patch: &FieldPatch<'_>,
    ) -> Result<ServerField, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let existing = sqlx::query_as::<_, ServerField>("SELECT * FROM server_fields WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Server field {id}")))?;

        let key = patch.key.unwrap_or(&existing.field_key);
        let field_type = patch
            .field_type
            .map_or(existing.field_type.as_str(), |t| t.as_str());

        sqlx::query(
            "UPDATE server_fields SET field_key = ?, label = ?, field_type = ?, unit = ?, options = ?, required = ?, \
             group_name = ?, order_index = ?, visible = ?, default_value = ? WHERE id = ?",
        )
        .bind(key)
        .bind(patch.label.unwrap_or(&existing.label))
        .bind(field_type)
        .bind(patch.unit.unwrap_or(existing.unit.as_deref()))
        .bind(patch.options.unwrap_or(existing.options.as_deref()))
        .bind(patch.required.unwrap_or(existing.required))
        .bind(patch.group.unwrap_or(existing.group_name.as_deref()))
        .bind(patch.order_index.unwrap_or(existing.order_index))
        .bind(patch.visible.unwrap_or(existing.visible))
        .bind(patch.default_value.unwrap_or(existing.default_value.as_deref()))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(key_conflict(key))?;

        let updated = sqlx::query_as::<_, ServerField>("SELECT * FROM server_fields WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a catalog entry, returning it.
    pub async fn remove_server_field(&self, id: i64) -> Result<ServerField, DatabaseError> {
        let existing = self.get_server_field(id).await?;

        sqlx::query("DELETE FROM server_fields WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(existing)
    }
}
