//! Page handlers
//!
//! Trivial HTML for the landing and profile pages. Everything
//! user-supplied is escaped before rendering.

use axum::{
    Router,
    extract::State,
    middleware,
    response::{Html, IntoResponse},
    routing::get,
};

use crate::AppState;
use crate::auth::middleware::{CurrentUser, MaybeUser, require_auth};

/// Create the page router
///
/// `/profile` sits behind the auth guard; `/` is public.
pub fn pages_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(profile_page))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new().route("/", get(landing_page)).merge(protected)
}

/// GET /
///
/// Landing page linking the configured login providers.
async fn landing_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> impl IntoResponse {
    let mut links = String::new();
    for provider in state.providers.configured() {
        links.push_str(&format!(
            r#"<div><a href="/auth/{provider}">Sign in with {title}</a></div>"#,
            title = match provider {
                crate::auth::provider::Provider::GitHub => "GitHub",
                crate::auth::provider::Provider::Google => "Google",
            },
        ));
    }

    let greeting = match &user {
        Some(user) => format!(
            "<p>Logged in as {}</p>",
            html_escape::encode_text(&user.username)
        ),
        None => String::new(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Authgate</title></head>
<body>
    <h1>Login Options</h1>
    {greeting}
    {links}
    <div><a href="/profile">User Profile</a></div>
</body>
</html>
"#,
    ))
}

/// GET /profile
///
/// Shows the authenticated identity. The guard has already verified
/// the credential by the time this runs.
async fn profile_page(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    let username = html_escape::encode_text(&user.username).into_owned();
    let profile_url = user
        .profile_url
        .as_deref()
        .map(|url| html_escape::encode_text(url).into_owned())
        .unwrap_or_else(|| "-".to_string());

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Profile - Authgate</title></head>
<body>
    <h1>User Profile</h1>
    <div>Username: {username}</div>
    <div>URL: {profile_url}</div>
    <div><a href="/">Back to Home</a></div>
</body>
</html>
"#,
    ))
}
