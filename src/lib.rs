//! Authgate - a minimal web server demonstrating third-party OAuth login
//!
//! # Architecture
//!
//! ```text
//! browser -> GET /auth/:provider          redirect to the provider
//!         -> provider login UI
//!         -> GET /auth/:provider/callback code-for-token exchange
//!                                         -> normalize profile
//!                                         -> issue credential
//!         -> GET /profile                 guard verifies on every request
//! ```
//!
//! # Modules
//!
//! - `api`: landing and profile pages
//! - `auth`: provider adapters, identity normalization, credential
//!   issuance, auth guard
//! - `config`: configuration management
//! - `error`: error types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains the configured
/// providers and the credential issuer.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Configured OAuth providers
    pub providers: Arc<auth::provider::ProviderRegistry>,

    /// Credential issuer for the configured strategy
    pub issuer: Arc<auth::issuer::Issuer>,
}

impl AppState {
    /// Initialize application state
    ///
    /// Builds the provider registry and the issuer from configuration.
    ///
    /// # Errors
    /// Returns error if a provider is misconfigured
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let providers = auth::provider::build_registry(&config.auth)?;
        let issuer = auth::issuer::Issuer::from_config(&config);

        tracing::info!(
            providers = ?providers.configured(),
            strategy = ?config.auth.strategy,
            "Application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            providers: Arc::new(providers),
            issuer: Arc::new(issuer),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .merge(api::pages_router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
