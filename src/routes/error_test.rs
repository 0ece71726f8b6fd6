use axum::body::to_bytes;

use super::*;
use crate::rate_limit::RateLimitError;

async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
    let resp = err.into_response();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn rate_limited() -> RateLimitError {
    RateLimitError::PerClientExceeded { limit: 10, window_secs: 60 }
}

#[tokio::test]
async fn envelope_shape() {
    let (status, body) = body_json(ApiError::bad_request("householdId is required")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "householdId is required"}));
}

#[tokio::test]
async fn usage_failure_hides_cause() {
    let (status, body) = body_json(UsageError::Db(sqlx::Error::PoolTimedOut).into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to get usage stats");
}

#[test]
fn scan_statuses() {
    assert_eq!(ApiError::from(ScanError::NoImage).status, StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(ScanError::InvalidImageFormat).status, StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(ScanError::InvalidBarcode).status, StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(ScanError::ProductNotFound).status, StatusCode::NOT_FOUND);

    let busy = ApiError::from(ScanError::RateLimited(rate_limited()));
    assert_eq!(busy.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(busy.message, BUSY_MESSAGE);
}

#[test]
fn chef_statuses() {
    let cases = [
        (ChefError::MissingMessage, StatusCode::BAD_REQUEST, "Message is required"),
        (ChefError::RateLimited(rate_limited()), StatusCode::TOO_MANY_REQUESTS, BUSY_MESSAGE),
        (ChefError::NotConfigured, StatusCode::SERVICE_UNAVAILABLE, "AI service is not configured"),
        (ChefError::Timeout, StatusCode::GATEWAY_TIMEOUT, "Request timed out. Please try a simpler question."),
        (
            ChefError::Llm(LlmError::ApiResponse { status: 401, body: "invalid x-api-key".into() }),
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI service configuration error",
        ),
        (
            ChefError::Llm(LlmError::ApiResponse { status: 429, body: String::new() }),
            StatusCode::TOO_MANY_REQUESTS,
            BUSY_MESSAGE,
        ),
        (
            ChefError::Llm(LlmError::ApiParse("eof".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to get AI response",
        ),
    ];

    for (err, status, message) in cases {
        let api = ApiError::from(err);
        assert_eq!(api.status, status);
        assert_eq!(api.message, message);
    }
}

#[test]
fn checkout_statuses() {
    assert_eq!(ApiError::from(CheckoutError::MissingFields).status, StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(CheckoutError::InvalidTier).status, StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(CheckoutError::PriceNotConfigured).status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ApiError::from(CheckoutError::NotConfigured).status, StatusCode::SERVICE_UNAVAILABLE);

    let rejected = ApiError::from(CheckoutError::Rejected { status: 400, message: "No such price: 'price_x'".into() });
    assert_eq!(rejected.status, StatusCode::BAD_GATEWAY);
    assert!(!rejected.message.contains("price_x"));
}

#[test]
fn webhook_statuses() {
    let missing = ApiError::from(WebhookError::MissingSignature);
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message, "Missing signature or webhook secret");

    for err in [WebhookError::MalformedHeader, WebhookError::StaleTimestamp, WebhookError::SignatureMismatch] {
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "Invalid signature");
    }

    assert_eq!(ApiError::from(WebhookError::Parse("eof".into())).status, StatusCode::BAD_REQUEST);

    let db = ApiError::from(WebhookError::Db(sqlx::Error::PoolTimedOut));
    assert_eq!(db.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(db.message, "Webhook handler failed");
    assert_eq!(ApiError::from(WebhookError::NotConfigured).status, StatusCode::INTERNAL_SERVER_ERROR);
}
