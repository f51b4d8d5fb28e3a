//! Authentication guard
//!
//! Protects routes that require authentication. Extracts the
//! credential from the request, verifies it through the issuer, and
//! attaches the authenticated user to the request; on failure the
//! request ends with 401 and a JSON error body.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, Uri, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::config::AuthStrategy;
use crate::error::AppError;

use super::identity::NormalizedUser;

/// Pull the credential out of a request
///
/// Bearer strategy: `Authorization: Bearer`, then a `token` header,
/// then a `token` query parameter, in that priority. The query form
/// exists because the post-login redirect cannot carry headers.
/// Session strategy: the session cookie.
fn extract_credential(state: &AppState, headers: &HeaderMap, uri: &Uri) -> Option<String> {
    match state.issuer.strategy() {
        AuthStrategy::Bearer => headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(ToOwned::to_owned)
            .or_else(|| {
                headers
                    .get("token")
                    .and_then(|h| h.to_str().ok())
                    .map(ToOwned::to_owned)
            })
            .or_else(|| token_query_param(uri)),
        AuthStrategy::Session => {
            let jar = CookieJar::from_headers(headers);
            jar.get(&state.config.auth.session_cookie)
                .map(|cookie| cookie.value().to_owned())
        }
    }
}

fn token_query_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

async fn authenticate(state: &AppState, headers: &HeaderMap, uri: &Uri) -> Result<NormalizedUser, AppError> {
    let credential = extract_credential(state, headers, uri).ok_or(AppError::Unauthorized)?;
    state.issuer.verify(&credential).await
}

/// Middleware to require authentication
///
/// Verifies the presented credential and adds the user to request
/// extensions. No refresh, no retry: a rejected request must
/// re-authenticate via the login route.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/profile", ...)
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, request.headers(), request.uri()).await?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extractor for the current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub NormalizedUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Extract the current user from request extensions, or verify the
    /// credential directly when used without the middleware layer.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<NormalizedUser>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let user = authenticate(&state, &parts.headers, &parts.uri).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<NormalizedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<NormalizedUser>().cloned() {
            return Ok(MaybeUser(Some(user)));
        }

        let state = AppState::from_ref(state);
        let user = authenticate(&state, &parts.headers, &parts.uri).await.ok();

        if let Some(user) = &user {
            parts.extensions.insert(user.clone());
        }

        Ok(MaybeUser(user))
    }
}
