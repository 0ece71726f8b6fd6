//! AI routes: food scanner and AI chef.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Serialize;

use super::error::ApiError;
use crate::services::chef::{self, ChefRequest};
use crate::services::scan::{self, ScanRequest, ScanResponse};
use crate::state::AppState;

const ANONYMOUS_CLIENT: &str = "anonymous";

/// Rate-limit key: first `X-Forwarded-For` hop, else a shared bucket.
pub(crate) fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_owned()
}

/// `POST /api/scan-food`
pub async fn scan_food(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanResponse>, ApiError> {
    let Json(req) = body?;
    let resp = scan::scan_food(&state, &client_key(&headers), req).await?;
    Ok(Json(resp))
}

#[derive(Debug, Serialize)]
pub struct ChefReply {
    reply: String,
}

/// `POST /api/ai-chef`
pub async fn ai_chef(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChefRequest>, JsonRejection>,
) -> Result<Json<ChefReply>, ApiError> {
    let Json(req) = body?;
    let reply = chef::ask_chef(&state, &client_key(&headers), req).await?;
    Ok(Json(ChefReply { reply }))
}

#[cfg(test)]
#[path = "ai_test.rs"]
mod tests;
