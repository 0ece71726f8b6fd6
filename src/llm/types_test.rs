use super::*;

#[test]
fn image_block_serializes_in_anthropic_shape() {
    let block = ContentBlock::Image { source: ImageSource::base64("image/png", "AAAA") };
    let json = serde_json::to_value(&block).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "type": "image",
            "source": { "type": "base64", "media_type": "image/png", "data": "AAAA" }
        })
    );
}

#[test]
fn text_content_serializes_as_plain_string() {
    let msg = Message::user_text("hello");
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json, serde_json::json!({ "role": "user", "content": "hello" }));
}

#[test]
fn unknown_block_type_deserializes_to_unknown() {
    let block: ContentBlock = serde_json::from_value(serde_json::json!({ "type": "server_tool_use", "id": "x" })).unwrap();
    assert!(matches!(block, ContentBlock::Unknown));
}

#[test]
fn thinking_block_deserializes_to_unknown() {
    let block: ContentBlock =
        serde_json::from_value(serde_json::json!({ "type": "thinking", "thinking": "hmm", "signature": "s" })).unwrap();
    assert!(matches!(block, ContentBlock::Unknown));
}

#[test]
fn first_text_skips_non_text_blocks() {
    let resp = ChatResponse {
        content: vec![
            ContentBlock::Unknown,
            ContentBlock::Text { text: "answer".into() },
            ContentBlock::Text { text: "second".into() },
        ],
        model: "m".into(),
        stop_reason: "end_turn".into(),
        input_tokens: 1,
        output_tokens: 1,
    };
    assert_eq!(resp.first_text(), Some("answer"));
}

#[test]
fn first_text_none_when_no_text() {
    let resp = ChatResponse {
        content: vec![],
        model: "m".into(),
        stop_reason: "end_turn".into(),
        input_tokens: 0,
        output_tokens: 0,
    };
    assert_eq!(resp.first_text(), None);
}

#[test]
fn status_only_for_api_response() {
    assert_eq!(LlmError::ApiResponse { status: 429, body: String::new() }.status(), Some(429));
    assert_eq!(LlmError::Timeout.status(), None);
    assert_eq!(LlmError::ApiRequest("boom".into()).status(), None);
}

