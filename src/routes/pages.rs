//! Page routes: thin wrappers that render `crate::pages` templates.

use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::http::Uri;
use axum::response::Html;
use serde::Deserialize;

use crate::pages;

pub async fn landing() -> Html<String> {
    Html(pages::landing().into_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    error: Option<String>,
}

pub async fn login(query: Result<Query<LoginQuery>, QueryRejection>) -> Html<String> {
    let params = query.map(|Query(q)| q).unwrap_or_default();
    Html(pages::login(params.error.as_deref()).into_string())
}

pub async fn onboarding() -> Html<String> {
    Html(pages::onboarding().into_string())
}

/// `/dashboard` and everything under it share one shell.
pub async fn dashboard(uri: Uri) -> Html<String> {
    Html(pages::dashboard(uri.path()).into_string())
}

pub async fn reset_password() -> Html<String> {
    Html(pages::reset_password().into_string())
}

/// Bare placeholder fragment, no document wrapper.
pub async fn loading() -> Html<String> {
    Html(pages::loading_placeholder().into_string())
}
