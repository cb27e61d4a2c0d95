//! Fleetbook Server Library
//!
//! Core functionality for the Fleetbook inventory server:
//! - `SQLite` storage for servers, tags, the field catalog, metrics, and the
//!   audit log
//! - JWT bearer authentication
//! - The axum HTTP API
//! - Sample data for demos

pub mod auth;
pub mod seed;
pub mod server;
pub mod storage;
