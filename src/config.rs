//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub host: String,
    /// Port number (default: 5000)
    pub port: u16,
}

/// Which credential the server mints for authenticated users
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategy {
    /// Signed JWT carried by the client (header or `token` query param)
    #[default]
    Bearer,
    /// Opaque server-side session id carried in a cookie
    Session,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Credential strategy (default: bearer)
    #[serde(default)]
    pub strategy: AuthStrategy,
    /// Where to send the browser when a login is denied or fails
    #[serde(default = "default_failure_redirect")]
    pub failure_redirect: String,
    /// GitHub OAuth app credentials
    pub github: Option<ProviderConfig>,
    /// Google OAuth app credentials
    pub google: Option<ProviderConfig>,
    /// Session cookie name (default: "session")
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    pub token: TokenConfig,
}

/// Per-provider OAuth configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect target registered with the provider,
    /// e.g. "http://localhost:5000/auth/github/callback"
    pub callback_url: String,
    /// Scopes requested on the authorize redirect
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Bearer token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// JWT signing secret (32+ bytes). Only required for the bearer
    /// strategy.
    #[serde(default)]
    pub secret: String,
    /// Token lifetime in seconds (default: 3600)
    pub ttl_secs: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

fn default_failure_redirect() -> String {
    "/".to_string()
}

fn default_session_cookie() -> String {
    "session".to_string()
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (AUTHGATE_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("auth.strategy", "bearer")?
            .set_default("auth.failure_redirect", "/")?
            .set_default("auth.session_cookie", "session")?
            .set_default("auth.session_max_age", 604_800)?
            .set_default("auth.token.ttl_secs", 3600)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (AUTHGATE_*)
            .add_source(
                Environment::with_prefix("AUTHGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_TOKEN_SECRET_BYTES: usize = 32;

        if self.auth.github.is_none() && self.auth.google.is_none() {
            return Err(crate::error::AppError::Config(
                "at least one of auth.github or auth.google must be configured".to_string(),
            ));
        }

        if self.auth.strategy == AuthStrategy::Bearer
            && self.auth.token.secret.as_bytes().len() < MIN_TOKEN_SECRET_BYTES
        {
            return Err(crate::error::AppError::Config(format!(
                "auth.token.secret must be at least {} bytes",
                MIN_TOKEN_SECRET_BYTES
            )));
        }

        if self.auth.token.ttl_secs <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.token.ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
