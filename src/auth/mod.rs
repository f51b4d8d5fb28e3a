//! Authentication
//!
//! - `provider`: OAuth provider adapters (GitHub, Google)
//! - `identity`: profile normalization
//! - `token` / `session` / `issuer`: credential issuance and verification
//! - `middleware`: auth guard for protected routes
//! - `routes`: login/callback/logout HTTP surface

pub mod identity;
pub mod issuer;
pub mod middleware;
pub mod provider;
pub mod routes;
pub mod session;
pub mod token;

pub use routes::auth_router;
