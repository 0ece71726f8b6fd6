use super::*;
use crate::llm::types::ImageSource;

fn make_response(content: serde_json::Value) -> String {
    serde_json::json!({
        "id": "msg_123",
        "type": "message",
        "role": "assistant",
        "content": content,
        "model": "claude-sonnet-4-20250514",
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 100, "output_tokens": 50 }
    })
    .to_string()
}

#[test]
fn parse_text_response() {
    let json = make_response(serde_json::json!([
        { "type": "text", "text": "Try a frittata tonight." }
    ]));
    let resp = parse_response(&json).unwrap();
    assert_eq!(resp.content.len(), 1);
    assert_eq!(resp.first_text(), Some("Try a frittata tonight."));
    assert_eq!(resp.model, "claude-sonnet-4-20250514");
    assert_eq!(resp.stop_reason, "end_turn");
    assert_eq!(resp.input_tokens, 100);
    assert_eq!(resp.output_tokens, 50);
}

#[test]
fn parse_keeps_only_text_blocks() {
    let json = make_response(serde_json::json!([
        { "type": "thinking", "thinking": "Let me think..." },
        { "type": "text", "text": "hi" },
        { "type": "some_future_type", "data": {} }
    ]));
    let resp = parse_response(&json).unwrap();
    assert_eq!(resp.content.len(), 1);
    assert!(matches!(&resp.content[0], ContentBlock::Text { text } if text == "hi"));
}

#[test]
fn parse_thinking_only_response_is_empty() {
    let json = make_response(serde_json::json!([
        { "type": "thinking", "thinking": "..." }
    ]));
    let resp = parse_response(&json).unwrap();
    assert!(resp.content.is_empty());
    assert_eq!(resp.first_text(), None);
}

#[test]
fn parse_invalid_json() {
    let err = parse_response("not json").unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(_)));
}

#[test]
fn request_omits_absent_system_prompt() {
    let messages = vec![Message::user_blocks(vec![
        ContentBlock::Image { source: ImageSource::base64("image/jpeg", "Zm9v") },
        ContentBlock::Text { text: "what is this?".into() },
    ])];
    let req = ApiRequest { model: "m", max_tokens: 2048, system: None, messages: &messages };
    let json = serde_json::to_value(&req).unwrap();
    assert!(json.get("system").is_none());
    assert_eq!(json["max_tokens"], 2048);
    assert_eq!(json["messages"][0]["content"][0]["type"], "image");
    assert_eq!(json["messages"][0]["content"][1]["text"], "what is this?");
}

#[test]
fn request_includes_system_prompt_when_present() {
    let messages = vec![Message::user_text("dinner?")];
    let req = ApiRequest { model: "m", max_tokens: 1024, system: Some("You are a chef"), messages: &messages };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["system"], "You are a chef");
}
