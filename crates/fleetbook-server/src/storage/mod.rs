//! `SQLite` storage for the Fleetbook inventory server.
//!
//! Provides persistence for servers and their tags, the field catalog,
//! metrics, and the audit log.

mod db;
mod models;
mod queries_audit;
mod queries_fields;
mod queries_metrics;
mod queries_servers;

#[cfg(test)]
mod test_support;

pub use db::{DatabaseError, InventoryDatabase};
pub use models::*;
pub use queries_audit::{AuditEntry, AuditFilter};
pub use queries_fields::{FieldPatch, NewServerField};
pub use queries_servers::{NewServer, ServerFilter, ServerPatch};

/// Unicode case folding for the `*_folded` search columns and the terms
/// matched against them.
pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}
