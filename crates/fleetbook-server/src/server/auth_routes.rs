//! Stub login.
//!
//! There is no user store: any request yields an admin token and the
//! password is never read. The body is read leniently; an unreadable one
//! logs in with an empty username.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::{instrument, warn};

use super::AppState;
use super::error::ApiError;
use crate::auth::claims::ADMIN_ROLE;

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: LoginUser,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/auth/login", post(login))
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = login_username(&body);
    warn!(username = %username, "Login accepted without verifying credentials");

    let (access_token, _ttl) = state.jwt.issue_access_token(&username, ADMIN_ROLE)?;

    Ok(Json(LoginResponse {
        access_token,
        user: LoginUser {
            username,
            role: ADMIN_ROLE.to_string(),
        },
    }))
}

/// Username from a login body. Non-string values are taken in their JSON
/// text form.
fn login_username(body: &[u8]) -> String {
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
        return String::new();
    };
    match fields.get("username") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
    }
}
