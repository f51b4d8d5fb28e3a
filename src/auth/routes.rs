//! OAuth login flow
//!
//! Implements the redirect/callback halves of the OAuth 2.0
//! authorization code flow against whichever providers are configured.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;

use super::identity::materialize;
use super::issuer::Credential;
use super::provider::Provider;

/// Create authentication router
///
/// Routes:
/// - GET /auth/:provider - Redirect to the provider's login page
/// - GET /auth/:provider/callback - OAuth callback
/// - POST /logout - Invalidate the current session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/:provider", get(begin_auth))
        .route("/auth/:provider/callback", get(auth_callback))
        .route("/logout", axum::routing::post(logout))
}

// =============================================================================
// Begin
// =============================================================================

/// GET /auth/:provider
///
/// Redirects the browser to the provider's authorization page with
/// client id, callback URL, and the configured scopes embedded.
async fn begin_auth(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect, AppError> {
    let provider: Provider = provider.parse()?;
    let adapter = state.providers.get(provider)?;

    let authorize_url = adapter.authorize_url();
    tracing::debug!(%provider, "Redirecting to provider authorize page");

    Ok(Redirect::to(authorize_url.as_str()))
}

// =============================================================================
// Callback
// =============================================================================

/// Query parameters on the provider's redirect back to us
///
/// A denied or cancelled login arrives without a usable `code`,
/// usually with `error` set instead.
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    #[allow(dead_code)]
    state: Option<String>,
}

/// GET /auth/:provider/callback
///
/// Completes the login: exchanges the authorization code for a profile,
/// normalizes it, and mints the credential. Denied logins and failed
/// exchanges redirect to the configured failure path with no credential
/// issued; the exchange is never retried because the provider consumes
/// the code on first use.
async fn auth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let provider: Provider = provider.parse()?;
    let adapter = state.providers.get(provider)?;

    let code = match query.code {
        Some(code) if !code.is_empty() => code,
        _ => {
            tracing::info!(
                %provider,
                error = query.error.as_deref().unwrap_or("no code"),
                "Login denied by user or provider"
            );
            return Ok(Redirect::to(&state.config.auth.failure_redirect).into_response());
        }
    };

    let profile = match adapter.exchange_code(&code).await {
        Ok(profile) => profile,
        Err(error) => {
            tracing::warn!(%provider, %error, "Code exchange failed");
            return Ok(Redirect::to(&state.config.auth.failure_redirect).into_response());
        }
    };

    let user = materialize(profile);
    tracing::info!(%provider, user_id = %user.id, username = %user.username, "Login succeeded");

    match state.issuer.issue(&user).await? {
        Credential::Bearer(token) => {
            // The redirect cannot carry a header, so the token rides
            // along as a query parameter.
            let target = format!("/profile?token={}", urlencoding::encode(&token));
            Ok(Redirect::to(&target).into_response())
        }
        Credential::Session(session_id) => {
            let cookie = Cookie::build((state.config.auth.session_cookie.clone(), session_id))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::seconds(state.config.auth.session_max_age))
                .build();

            Ok((jar.add(cookie), Redirect::to("/profile")).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
///
/// Deletes the server-side session and clears its cookie, then
/// redirects home. Under the bearer strategy there is nothing to
/// revoke; the token simply expires.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = if let Some(cookie) = jar.get(&state.config.auth.session_cookie) {
        state.issuer.revoke(cookie.value()).await;
        jar.remove(Cookie::from(state.config.auth.session_cookie.clone()))
    } else {
        jar
    };

    (jar, Redirect::to("/"))
}
