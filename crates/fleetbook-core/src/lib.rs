//! Fleetbook Core Library
//!
//! Shared functionality for the Fleetbook inventory service:
//! - `SQLite` pool helpers and the `define_database!` macro
//! - Inventory vocabulary (environments, field types, sort keys, audit actions)
//! - Dynamic attribute validation against the field catalog
//! - Offset pagination
//! - Configuration resolution and tracing setup

pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod pagination;
pub mod time;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use pagination::PageRequest;
