use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::routing::get;
use time::OffsetDateTime;
use tower::ServiceExt;

use super::*;
use crate::services::usage::HouseholdUsageRow;
use crate::state::test_helpers::{MockHouseholdStore, test_app_state};

fn router(state: AppState) -> Router {
    Router::new().route("/api/usage", get(get_usage)).with_state(state)
}

async fn call(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn state_with_household() -> AppState {
    let row = HouseholdUsageRow {
        subscription_tier: Some("free".into()),
        ai_suggestions_this_week: Some(3),
        ai_suggestions_reset_at: Some(OffsetDateTime::now_utc()),
        trial_ends_at: None,
        subscription_status: None,
    };
    test_app_state().with_households(Arc::new(MockHouseholdStore::default().with_household("hh-1", row)))
}

#[tokio::test]
async fn missing_household_id_is_400() {
    let (status, body) = call(state_with_household(), "/api/usage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "householdId is required");
}

#[tokio::test]
async fn empty_household_id_is_400() {
    let (status, _) = call(state_with_household(), "/api/usage?householdId=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_household_is_404() {
    let (status, body) = call(state_with_household(), "/api/usage?householdId=nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({"success": false, "error": "Household not found"}));
}

#[tokio::test]
async fn known_household_returns_usage() {
    let (status, body) = call(state_with_household(), "/api/usage?householdId=hh-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["usage"]["suggestionsUsed"], 3);
    assert_eq!(body["usage"]["suggestionsLimit"], 5);
    assert_eq!(body["usage"]["remainingSuggestions"], 2);
    assert_eq!(body["usage"]["canUseAI"], true);
    assert_eq!(body["usage"]["status"], "active");
}

#[tokio::test]
async fn store_failure_is_500() {
    let state = test_app_state().with_households(Arc::new(MockHouseholdStore::failing()));
    let (status, body) = call(state, "/api/usage?householdId=hh-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to get usage stats");
}

#[tokio::test]
async fn no_store_is_500() {
    let (status, _) = call(test_app_state(), "/api/usage?householdId=hh-1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
