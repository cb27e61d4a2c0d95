//! JWT claims structure for Fleetbook bearer tokens.

use serde::{Deserialize, Serialize};

/// Role granted to every caller by the stub login.
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (the username; there is no user table).
    pub sub: String,
    /// Username, recorded as the actor on audit entries.
    pub username: String,
    pub role: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}
