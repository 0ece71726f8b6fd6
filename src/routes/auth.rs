//! Auth routes: OAuth code callback and the page session gates.
//!
//! DESIGN
//! ======
//! Supabase owns accounts and passwords. The server only exchanges the
//! one-time code the provider redirects back with, stores the resulting
//! session in a cookie the browser client can read, and gates page routes
//! on the presence of a session cookie. Token validation happens in
//! Supabase when the client uses the session.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use tracing::{error, info};

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sb-auth-token";
const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";
const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

const DEFAULT_NEXT: &str = "/dashboard";
const RECOVERY_TARGET: &str = "/reset-password";
const AUTH_FAILED_TARGET: &str = "/login?error=auth_failed";
const SESSION_MAX_AGE: Duration = Duration::weeks(1);

/// Only same-origin absolute paths are accepted as redirect targets.
///
/// Every byte must be visible ASCII: browsers drop tabs and newlines while
/// parsing a `Location`, so `/\t/host` would resolve as `//host`, and control
/// bytes cannot be written into the header at all.
pub(crate) fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && path.bytes().all(|b| b.is_ascii_graphic()) =>
        {
            path
        }
        _ => DEFAULT_NEXT,
    }
}

/// `302 Found` to `target`. Callers pass sanitized paths or constants.
fn found(target: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, target)]).into_response()
}

/// True when any cookie the browser client may hold a session in is set.
pub(crate) fn has_session(jar: &CookieJar) -> bool {
    let named = [SESSION_COOKIE, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .iter()
        .any(|name| jar.get(name).is_some_and(|c| !c.value().is_empty()));

    named
        || jar
            .iter()
            .any(|c| c.name().contains("supabase") && c.name().contains("auth") && !c.value().is_empty())
}

/// `/login?redirect=<path>` with the path query-encoded.
pub(crate) fn login_redirect_url(path: &str) -> String {
    match reqwest::Url::parse_with_params("http://localhost/login", [("redirect", path)]) {
        Ok(url) => format!("{}?{}", url.path(), url.query().unwrap_or_default()),
        Err(_) => "/login".to_owned(),
    }
}

// =============================================================================
// CALLBACK
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    next: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// `GET /auth/callback`: exchange the code, set the session cookie, redirect.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let params = query.map(|Query(q)| q).unwrap_or_default();
    let next = sanitize_next(params.next.as_deref()).to_owned();

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return found(&next);
    };

    let verifier = jar.get(CODE_VERIFIER_COOKIE).map(Cookie::value);
    let session = match state.identity.exchange_code(&code, verifier).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "auth callback: code exchange failed");
            return found(AUTH_FAILED_TARGET);
        }
    };

    let target = if params.kind.as_deref() == Some("recovery") { RECOVERY_TARGET.to_owned() } else { next };
    info!(%target, "auth callback: session established");

    let session_cookie = Cookie::build((SESSION_COOKIE, session.to_cookie_value()))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(SESSION_MAX_AGE);
    let clear_verifier_cookie = Cookie::build((CODE_VERIFIER_COOKIE, ""))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(Duration::ZERO);

    let jar = jar.add(session_cookie).add(clear_verifier_cookie);
    (jar, found(&target)).into_response()
}

// =============================================================================
// SESSION GATES
// =============================================================================

/// Route layer for pages that need a signed-in user.
pub async fn require_session(jar: CookieJar, req: Request, next: Next) -> Response {
    if has_session(&jar) {
        return next.run(req).await;
    }
    Redirect::temporary(&login_redirect_url(req.uri().path())).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct GateQuery {
    redirect: Option<String>,
}

/// Route layer for sign-in pages: a signed-in user goes straight on.
pub async fn redirect_signed_in(
    jar: CookieJar,
    query: Result<Query<GateQuery>, QueryRejection>,
    req: Request,
    next: Next,
) -> Response {
    if !has_session(&jar) {
        return next.run(req).await;
    }
    let params = query.map(|Query(q)| q).unwrap_or_default();
    Redirect::temporary(sanitize_next(params.redirect.as_deref())).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
