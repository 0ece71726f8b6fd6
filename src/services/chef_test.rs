use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::llm::types::{ChatResponse, Content, ContentBlock};
use crate::state::test_helpers::{MockLlm, test_app_state, test_app_state_with_llm, tight_rate_limiter};

fn request(body: serde_json::Value) -> ChefRequest {
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn missing_message_is_rejected() {
    let state = test_app_state();
    let err = ask_chef(&state, "c1", ChefRequest::default()).await.unwrap_err();
    assert!(matches!(err, ChefError::MissingMessage));
    assert_eq!(err.to_string(), "Message is required");
}

#[tokio::test]
async fn non_string_or_empty_message_is_rejected() {
    let state = test_app_state();
    for body in [json!({"message": 42}), json!({"message": ["a"]}), json!({"message": ""})] {
        let err = ask_chef(&state, "c1", request(body)).await.unwrap_err();
        assert!(matches!(err, ChefError::MissingMessage));
    }
}

#[tokio::test]
async fn validation_failure_does_not_consume_quota() {
    let state = test_app_state().with_rate_limiter(tight_rate_limiter(1));
    let _ = ask_chef(&state, "c1", ChefRequest::default()).await;
    // The one allowed slot is still free, so this reaches the LLM check.
    let err = ask_chef(&state, "c1", request(json!({"message": "hi"}))).await.unwrap_err();
    assert!(matches!(err, ChefError::NotConfigured));
}

#[tokio::test]
async fn unconfigured_llm_is_reported() {
    let state = test_app_state();
    let err = ask_chef(&state, "c1", request(json!({"message": "dinner?"}))).await.unwrap_err();
    assert!(matches!(err, ChefError::NotConfigured));
}

#[tokio::test]
async fn reply_is_first_text_block() {
    let llm = Arc::new(MockLlm::replying("Try a veggie stir-fry tonight."));
    let state = test_app_state_with_llm(llm.clone());

    let reply = ask_chef(
        &state,
        "c1",
        request(json!({"message": "What can I cook?", "context": {"pantry": ["rice", "broccoli"]}})),
    )
    .await
    .unwrap();
    assert_eq!(reply, "Try a veggie stir-fry tonight.");

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].max_tokens, 1024);
    let system = calls[0].system.as_deref().unwrap();
    assert!(system.contains("AI Chef for BestMealMate"));
    assert!(system.contains("\"broccoli\""));
    assert!(matches!(&calls[0].messages[0].content, Content::Text(t) if t == "What can I cook?"));
}

#[tokio::test]
async fn reply_without_text_uses_fallback() {
    let response = ChatResponse {
        content: vec![ContentBlock::Unknown],
        model: "mock".into(),
        stop_reason: "end_turn".into(),
        input_tokens: 1,
        output_tokens: 1,
    };
    let state = test_app_state_with_llm(Arc::new(MockLlm::with_response(response)));
    let reply = ask_chef(&state, "c1", request(json!({"message": "hi"}))).await.unwrap();
    assert_eq!(reply, FALLBACK_REPLY);
}

#[tokio::test]
async fn provider_errors_are_passed_through() {
    let llm = MockLlm::failing(LlmError::ApiResponse { status: 401, body: "bad key".into() });
    let state = test_app_state_with_llm(Arc::new(llm));
    let err = ask_chef(&state, "c1", request(json!({"message": "hi"}))).await.unwrap_err();
    assert!(matches!(err, ChefError::Llm(ref e) if e.status() == Some(401)));
}

#[tokio::test]
async fn client_timeout_maps_to_deadline() {
    let state = test_app_state_with_llm(Arc::new(MockLlm::failing(LlmError::Timeout)));
    let err = ask_chef(&state, "c1", request(json!({"message": "hi"}))).await.unwrap_err();
    assert!(matches!(err, ChefError::Timeout));
}

#[tokio::test]
async fn slow_model_hits_deadline() {
    let llm = MockLlm::replying("late").with_delay(Duration::from_millis(500));
    let mut state = test_app_state_with_llm(Arc::new(llm));
    state.chef_deadline = Duration::from_millis(20);

    let err = ask_chef(&state, "c1", request(json!({"message": "hi"}))).await.unwrap_err();
    assert!(matches!(err, ChefError::Timeout));
}

#[tokio::test]
async fn rate_limit_applies_per_client() {
    let state = test_app_state_with_llm(Arc::new(MockLlm::default())).with_rate_limiter(tight_rate_limiter(1));

    ask_chef(&state, "c1", request(json!({"message": "one"}))).await.unwrap();
    let err = ask_chef(&state, "c1", request(json!({"message": "two"}))).await.unwrap_err();
    assert!(matches!(err, ChefError::RateLimited(_)));

    // Another client still has quota.
    ask_chef(&state, "c2", request(json!({"message": "three"}))).await.unwrap();
}

#[test]
fn system_prompt_embeds_null_context() {
    let prompt = system_prompt(&serde_json::Value::Null);
    assert!(prompt.contains("Current context:\nnull"));
}
