//! Database connection and initialization.

pub use fleetbook_core::db::DatabaseError;

fleetbook_core::define_database!(InventoryDatabase, "Inventory database migrations complete");
