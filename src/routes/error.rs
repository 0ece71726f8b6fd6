//! API error envelope.
//!
//! Every JSON endpoint fails with `{"success": false, "error": <message>}`.
//! Service errors convert here; the conversion picks the status and the
//! client-facing message and logs any internal cause, which never reaches
//! the response body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::llm::types::LlmError;
use crate::services::billing::WebhookError;
use crate::services::checkout::CheckoutError;
use crate::services::chef::ChefError;
use crate::services::scan::ScanError;
use crate::services::usage::UsageError;

pub const BUSY_MESSAGE: &str = "AI service is busy. Please try again in a moment.";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn busy() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, BUSY_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "success": false, "error": self.message }))).into_response()
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "rejected request body");
        Self::bad_request("Invalid JSON body")
    }
}

impl From<UsageError> for ApiError {
    fn from(err: UsageError) -> Self {
        error!(error = %err, "usage lookup failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get usage stats")
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::NoImage | ScanError::InvalidImageFormat | ScanError::InvalidBarcode => {
                Self::bad_request(err.to_string())
            }
            ScanError::ProductNotFound => Self::not_found(err.to_string()),
            ScanError::RateLimited(e) => {
                warn!(error = %e, "scan: rate limited");
                Self::busy()
            }
        }
    }
}

impl From<ChefError> for ApiError {
    fn from(err: ChefError) -> Self {
        match err {
            ChefError::MissingMessage => Self::bad_request(err.to_string()),
            ChefError::RateLimited(e) => {
                warn!(error = %e, "chef: rate limited");
                Self::busy()
            }
            ChefError::NotConfigured => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "AI service is not configured")
            }
            ChefError::Timeout => {
                warn!("chef: deadline exceeded");
                Self::new(StatusCode::GATEWAY_TIMEOUT, "Request timed out. Please try a simpler question.")
            }
            ChefError::Llm(e) => Self::from_chef_llm(&e),
        }
    }
}

impl ApiError {
    fn from_chef_llm(err: &LlmError) -> Self {
        error!(error = %err, "chef: LLM call failed");
        match err.status() {
            Some(401) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "AI service configuration error"),
            Some(429) => Self::busy(),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get AI response"),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::MissingFields | CheckoutError::InvalidTier => Self::bad_request(err.to_string()),
            CheckoutError::PriceNotConfigured => {
                error!(error = %err, "checkout: price id missing");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            CheckoutError::NotConfigured => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Payment service is not configured")
            }
            CheckoutError::HttpClientBuild(_)
            | CheckoutError::Request(_)
            | CheckoutError::Rejected { .. }
            | CheckoutError::Parse(_) => {
                error!(error = %err, "checkout: stripe call failed");
                Self::new(StatusCode::BAD_GATEWAY, "Failed to create checkout session")
            }
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::MissingSignature => Self::bad_request(err.to_string()),
            WebhookError::MalformedHeader | WebhookError::StaleTimestamp | WebhookError::SignatureMismatch => {
                warn!(error = %err, "stripe webhook: signature verification failed");
                Self::bad_request("Invalid signature")
            }
            WebhookError::Parse(_) => {
                warn!(error = %err, "stripe webhook: unreadable event");
                Self::bad_request("Invalid payload")
            }
            WebhookError::NotConfigured | WebhookError::Db(_) => {
                error!(error = %err, "stripe webhook: handler failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Webhook handler failed")
            }
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
