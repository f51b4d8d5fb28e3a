//! OAuth provider adapters
//!
//! Each adapter wraps one third-party OAuth 2.0 authorization code flow:
//! building the authorize redirect URL, exchanging the callback code for
//! an access token, and fetching the user profile with it.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::AppError;

use super::identity::RawProfile;

/// Supported OAuth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    GitHub,
    Google,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::Google => "google",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Provider::GitHub),
            "google" => Ok(Provider::Google),
            other => Err(AppError::ProviderNotFound(other.to_string())),
        }
    }
}

/// One third-party login integration
///
/// `authorize_url` starts a login attempt; `exchange_code` finishes it.
/// A denied or failed exchange is terminal for the attempt; callers
/// redirect the user back to the start rather than retry, since an
/// authorization code is consumed by the first exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Build the provider's authorization URL embedding client id,
    /// callback URL, and requested scopes.
    fn authorize_url(&self) -> Url;

    /// Exchange an authorization code for an access token, then fetch
    /// the user profile with it.
    async fn exchange_code(&self, code: &str) -> Result<RawProfile, AppError>;
}

/// Configured providers, keyed by name
///
/// Built once at startup from configuration. The `/auth/:provider`
/// route only selects among these entries.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Provider, Arc<dyn OAuthProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn OAuthProvider>) {
        self.providers.insert(provider.provider(), provider);
    }

    pub fn get(&self, provider: Provider) -> Result<&Arc<dyn OAuthProvider>, AppError> {
        self.providers
            .get(&provider)
            .ok_or_else(|| AppError::ProviderNotFound(provider.to_string()))
    }

    /// Providers available for login, for rendering the landing page
    pub fn configured(&self) -> Vec<Provider> {
        let mut names: Vec<Provider> = self.providers.keys().copied().collect();
        names.sort_by_key(|p| p.as_str());
        names
    }
}

/// Common machinery for the two redirect-based providers
///
/// Stores the raw endpoint pieces and rebuilds the `oauth2` client per
/// call; the typestate-parameterized client type is not worth naming.
struct OAuthEndpoints {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    scopes: Vec<Scope>,
}

impl OAuthEndpoints {
    fn from_config(
        config: &ProviderConfig,
        auth_url: &str,
        token_url: &str,
    ) -> Result<Self, AppError> {
        Ok(Self {
            client_id: ClientId::new(config.client_id.clone()),
            client_secret: ClientSecret::new(config.client_secret.clone()),
            auth_url: AuthUrl::new(auth_url.to_string())
                .map_err(|e| AppError::Config(e.to_string()))?,
            token_url: TokenUrl::new(token_url.to_string())
                .map_err(|e| AppError::Config(e.to_string()))?,
            redirect_url: RedirectUrl::new(config.callback_url.clone())
                .map_err(|e| AppError::Config(e.to_string()))?,
            scopes: config.scopes.iter().cloned().map(Scope::new).collect(),
        })
    }

    fn authorize_url(&self) -> Url {
        // The state parameter is required by both providers but is not
        // verified on callback; CSRF protection is out of scope here.
        let (auth_url, _csrf_token) = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes.iter().cloned())
            .url();

        auth_url
    }

    async fn exchange_code(
        &self,
        code: &str,
        http_client: &reqwest::Client,
    ) -> Result<String, AppError> {
        let token_result = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(http_client)
            .await
            .map_err(|e| {
                let message = match &e {
                    oauth2::RequestTokenError::ServerResponse(err) => {
                        format!("provider rejected the code: {:?}", err.error_description())
                    }
                    other => format!("token request failed: {other:?}"),
                };
                AppError::Exchange(message)
            })?;

        Ok(token_result.access_token().secret().to_string())
    }
}

/// Build an HTTP client suitable for token-endpoint calls
///
/// Redirect following is disabled so a misbehaving provider cannot
/// bounce the token request elsewhere.
pub fn oauth_http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!("authgate/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(AppError::HttpClient)
}

// =============================================================================
// GitHub
// =============================================================================

pub struct GitHubProvider {
    endpoints: OAuthEndpoints,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    html_url: Option<String>,
    avatar_url: Option<String>,
}

impl GitHubProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, AppError> {
        Ok(Self {
            endpoints: OAuthEndpoints::from_config(
                config,
                "https://github.com/login/oauth/authorize",
                "https://github.com/login/oauth/access_token",
            )?,
            http_client: oauth_http_client()?,
        })
    }
}

#[async_trait]
impl OAuthProvider for GitHubProvider {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn authorize_url(&self) -> Url {
        self.endpoints.authorize_url()
    }

    async fn exchange_code(&self, code: &str) -> Result<RawProfile, AppError> {
        let access_token = self.endpoints.exchange_code(code, &self.http_client).await?;

        let raw: serde_json::Value = self
            .http_client
            .get("https://api.github.com/user")
            .bearer_auth(&access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let user: GitHubUser = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::Exchange(format!("unexpected GitHub profile shape: {e}")))?;

        Ok(RawProfile {
            provider: Provider::GitHub,
            id: user.id.to_string(),
            username: user.login,
            profile_url: user.html_url,
            avatar_url: user.avatar_url,
            raw,
        })
    }
}

// =============================================================================
// Google
// =============================================================================

pub struct GoogleProvider {
    endpoints: OAuthEndpoints,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, AppError> {
        Ok(Self {
            endpoints: OAuthEndpoints::from_config(
                config,
                "https://accounts.google.com/o/oauth2/v2/auth",
                "https://oauth2.googleapis.com/token",
            )?,
            http_client: oauth_http_client()?,
        })
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn authorize_url(&self) -> Url {
        self.endpoints.authorize_url()
    }

    async fn exchange_code(&self, code: &str) -> Result<RawProfile, AppError> {
        let access_token = self.endpoints.exchange_code(code, &self.http_client).await?;

        let raw: serde_json::Value = self
            .http_client
            .get("https://www.googleapis.com/oauth2/v3/userinfo")
            .bearer_auth(&access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let user: GoogleUser = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::Exchange(format!("unexpected Google profile shape: {e}")))?;

        // Google has no display username; fall back to the email local
        // part when the display name is absent.
        let username = user
            .name
            .or_else(|| {
                user.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .map(ToOwned::to_owned)
            })
            .unwrap_or_else(|| "user".to_string());

        Ok(RawProfile {
            provider: Provider::Google,
            id: user.sub,
            username,
            profile_url: None,
            avatar_url: user.picture,
            raw,
        })
    }
}

/// Build the provider registry from configuration
pub fn build_registry(auth: &crate::config::AuthConfig) -> Result<ProviderRegistry, AppError> {
    let mut registry = ProviderRegistry::new();

    if let Some(github) = &auth.github {
        registry.register(Arc::new(GitHubProvider::new(github)?));
    }

    if let Some(google) = &auth.google {
        registry.register(Arc::new(GoogleProvider::new(google)?));
    }

    Ok(registry)
}
