//! Authentication for the Fleetbook API.
//!
//! Bearer tokens are HS256 JWTs. Login is a stub that issues a token for any
//! username; see [`crate::server::auth_routes`].

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::JwtManager;
