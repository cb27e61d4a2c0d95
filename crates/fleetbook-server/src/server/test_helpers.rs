//! Shared setup for the route and ingestion test modules.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use fleetbook_core::config::RegistryConfig;

use super::{AppState, build_router};
use crate::auth::JwtManager;
use crate::auth::claims::ADMIN_ROLE;
use crate::storage::{InventoryDatabase, NewServer};

pub async fn test_db() -> InventoryDatabase {
    InventoryDatabase::open_in_memory().await.unwrap()
}

/// Insert a bare `dev` server with no tags.
pub async fn seed_server(db: &InventoryDatabase, id: &str, name: &str) {
    db.create_server(
        &NewServer {
            id,
            name,
            ip_address: None,
            environment: "dev",
            os: None,
            role: None,
            location: None,
            attributes: "{}",
            tags: &[],
        },
        "seed",
        &serde_json::json!({}),
    )
    .await
    .unwrap();
}

pub async fn test_state(enforce_attribute_schema: bool) -> AppState {
    AppState {
        db: test_db().await,
        jwt: Arc::new(JwtManager::new(b"test-secret", 3600)),
        registry: Arc::new(RegistryConfig {
            enforce_attribute_schema,
            ..RegistryConfig::default()
        }),
    }
}

/// A valid `Authorization` header value for `username`.
pub fn bearer(state: &AppState, username: &str) -> String {
    let (token, _) = state.jwt.issue_access_token(username, ADMIN_ROLE).unwrap();
    format!("Bearer {token}")
}

/// Drives a router built from one shared state.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    auth: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_state(test_state(false).await)
    }

    pub async fn enforcing() -> Self {
        Self::with_state(test_state(true).await)
    }

    fn with_state(state: AppState) -> Self {
        Self {
            router: build_router(state.clone()),
            auth: bearer(&state, "alice"),
            state,
        }
    }

    /// Send an authenticated request; returns status and parsed JSON body
    /// (`Null` when the body is empty).
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", &self.auth);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }
}
