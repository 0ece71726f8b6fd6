//! Stripe routes: subscription checkout and the billing webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Serialize;

use super::error::ApiError;
use crate::services::billing;
use crate::services::checkout::{self, CheckoutRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    url: Option<String>,
}

/// `POST /api/stripe/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let Json(req) = body?;
    let url = checkout::start_checkout(state.checkout.as_deref(), &state.prices, &state.config.app_url, req).await?;
    Ok(Json(CheckoutResponse { url }))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    received: bool,
}

/// `POST /api/stripe/webhook`: the body is read raw so the signature covers
/// exactly the bytes Stripe sent.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers.get("stripe-signature").and_then(|v| v.to_str().ok());
    billing::handle_webhook(
        state.subscriptions.as_deref(),
        state.config.stripe_webhook_secret.as_deref(),
        &state.prices,
        &body,
        signature,
    )
    .await?;
    Ok(Json(WebhookAck { received: true }))
}

#[cfg(test)]
#[path = "stripe_test.rs"]
mod tests;
