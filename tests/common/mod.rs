//! Common test utilities for E2E tests

use std::sync::Arc;

use async_trait::async_trait;
use authgate::auth::identity::RawProfile;
use authgate::auth::provider::{OAuthProvider, Provider, ProviderRegistry, build_registry};
use authgate::error::AppError;
use authgate::{AppState, config};
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

/// Stand-in GitHub provider resolving canned codes to canned profiles
///
/// Lets callback tests run the full exchange-materialize-issue path
/// without talking to a real provider.
pub struct FakeProvider;

impl FakeProvider {
    fn profile(id: &str, username: &str, profile_url: Option<&str>) -> RawProfile {
        RawProfile {
            provider: Provider::GitHub,
            id: id.to_string(),
            username: username.to_string(),
            profile_url: profile_url.map(ToOwned::to_owned),
            avatar_url: None,
            raw: serde_json::json!({"fake": true}),
        }
    }
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn authorize_url(&self) -> url::Url {
        url::Url::parse("https://github.example/login/oauth/authorize?client_id=fake").unwrap()
    }

    async fn exchange_code(&self, code: &str) -> Result<RawProfile, AppError> {
        match code {
            "code-alice" => Ok(Self::profile(
                "42",
                "alice",
                Some("https://github.com/alice"),
            )),
            "code-bob" => Ok(Self::profile("77", "bob", Some("https://github.com/bob"))),
            other => Err(AppError::Exchange(format!(
                "provider rejected the code: {other}"
            ))),
        }
    }
}

/// Test configuration with GitHub configured and a fixed token secret
pub fn test_config(strategy: config::AuthStrategy) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        auth: config::AuthConfig {
            strategy,
            failure_redirect: "/".to_string(),
            github: Some(config::ProviderConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                callback_url: "http://localhost:5000/auth/github/callback".to_string(),
                scopes: vec!["read:user".to_string()],
            }),
            google: None,
            session_cookie: "session".to_string(),
            session_max_age: 604_800,
            token: config::TokenConfig {
                secret: "test-secret-key-32-bytes-long!!!".to_string(),
                ttl_secs: 3600,
            },
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a test server whose GitHub adapter is the fake provider
    pub async fn new(strategy: config::AuthStrategy) -> Self {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(FakeProvider));
        Self::with_registry(strategy, registry).await
    }

    /// Create a test server with the real GitHub adapter
    ///
    /// Building the authorize URL needs no network, so begin-auth tests
    /// can assert the real redirect contents.
    pub async fn with_real_github(strategy: config::AuthStrategy) -> Self {
        let config = test_config(strategy);
        let registry = build_registry(&config.auth).expect("registry builds from test config");
        Self::with_registry(strategy, registry).await
    }

    async fn with_registry(strategy: config::AuthStrategy, registry: ProviderRegistry) -> Self {
        let config = test_config(strategy);

        let mut state = AppState::new(config).expect("test state initializes");
        state.providers = Arc::new(registry);

        // Create HTTP client that does not follow redirects, so tests
        // can assert on Location headers.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build test client");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = authgate::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Run the login callback for a canned code and return the redirect
    /// Location header plus any Set-Cookie value.
    pub async fn login(&self, code: &str) -> (String, Option<String>) {
        let response = self
            .client
            .get(self.url(&format!("/auth/github/callback?code={code}&state=ignored")))
            .send()
            .await
            .expect("callback request succeeds");

        assert!(
            response.status().is_redirection(),
            "expected redirect, got {}",
            response.status()
        );

        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .expect("location header")
            .to_string();
        let set_cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        (location, set_cookie)
    }
}

/// Extract `name=value` from a Set-Cookie header value
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

/// Extract the token from a `/profile?token=...` redirect location
pub fn token_from_location(location: &str) -> String {
    location
        .strip_prefix("/profile?token=")
        .expect("post-login redirect carries the token")
        .to_string()
}
