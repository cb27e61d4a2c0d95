//! HTTP API for Fleetbook.
//!
//! `/health` and `/api/auth/login` are open; every other route sits behind
//! [`middleware::require_bearer`].

pub mod audit_routes;
pub mod auth_routes;
pub mod error;
pub mod field_routes;
pub mod health;
pub mod ingest;
pub mod metric_routes;
pub mod middleware;
pub mod patch;
pub mod server_routes;
pub mod views;

#[cfg(test)]
mod ingest_tests;
#[cfg(test)]
mod routes_tests;
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use fleetbook_core::config::RegistryConfig;

use crate::auth::JwtManager;
use crate::storage::InventoryDatabase;

pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: InventoryDatabase,
    pub jwt: Arc<JwtManager>,
    pub registry: Arc<RegistryConfig>,
}

/// Build the full router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .merge(server_routes::routes())
        .merge(field_routes::routes())
        .merge(metric_routes::routes())
        .merge(audit_routes::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_bearer,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(auth_routes::routes())
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
