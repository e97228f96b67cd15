// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn user_prompt_wraps_text_block() {
    let msg = AgentMessage::user_prompt("ses-1".into(), "hello", 1_000);
    assert_eq!(msg.role, MessageRole::User);
    assert_eq!(msg.text_preview.as_deref(), Some("hello"));
    let blocks = parse_blocks(&msg.content);
    assert_eq!(blocks, vec![ContentBlock::Text { text: "hello".into() }]);
}

#[test]
fn extract_role_matches_type_tags() {
    assert_eq!(extract_role(&json!({"_type": "AssistantMessage"})), MessageRole::Assistant);
    assert_eq!(extract_role(&json!({"_type": "sdk.UserMessage"})), MessageRole::User);
    assert_eq!(extract_role(&json!({"_type": "SystemMessage"})), MessageRole::System);
    assert_eq!(extract_role(&json!({"_type": "ResultMessage"})), MessageRole::Assistant);
}

#[test]
fn unknown_type_defaults_to_assistant() {
    assert_eq!(extract_role(&json!({"_type": "HologramMessage"})), MessageRole::Assistant);
    assert_eq!(extract_role(&json!({})), MessageRole::Assistant);
}

#[test]
fn parse_blocks_reads_tool_use() {
    let msg = json!({
        "_type": "AssistantMessage",
        "content": [
            {"_type": "ToolUseBlock", "id": "t1", "name": "Read", "input": {"path": "/f"}},
        ],
    });
    let blocks = parse_blocks(&msg);
    assert_eq!(
        blocks,
        vec![ContentBlock::ToolUse {
            id: "t1".into(),
            name: "Read".into(),
            input: Some(json!({"path": "/f"})),
        }]
    );
}

#[test]
fn parse_blocks_reads_tool_result_with_null_content() {
    let msg = json!({
        "_type": "UserMessage",
        "content": [
            {"_type": "ToolResultBlock", "tool_use_id": "t1", "content": null, "is_error": true},
        ],
    });
    let blocks = parse_blocks(&msg);
    assert_eq!(
        blocks,
        vec![ContentBlock::ToolResult { tool_use_id: "t1".into(), content: None, is_error: true }]
    );
}

#[test]
fn parse_blocks_skips_unknown_and_malformed() {
    let msg = json!({
        "content": [
            {"_type": "ThinkingBlock", "thinking": "..."},
            {"_type": "ToolUseBlock", "name": "Read"},
            "not-a-block",
            {"_type": "TextBlock", "text": "ok"},
        ],
    });
    let blocks = parse_blocks(&msg);
    assert_eq!(blocks, vec![ContentBlock::Text { text: "ok".into() }]);
}

#[test]
fn text_preview_takes_first_text_block_truncated() {
    let long = "x".repeat(600);
    let msg = json!({
        "content": [
            {"_type": "ToolUseBlock", "id": "t1", "name": "Bash", "input": {}},
            {"_type": "TextBlock", "text": long},
            {"_type": "TextBlock", "text": "second"},
        ],
    });
    let preview = text_preview(&msg).unwrap();
    assert_eq!(preview.len(), TEXT_PREVIEW_MAX);
    assert!(preview.chars().all(|c| c == 'x'));
}

#[test]
fn text_preview_absent_without_text_blocks() {
    assert_eq!(text_preview(&json!({"content": []})), None);
    assert_eq!(text_preview(&json!({})), None);
}

#[test]
fn result_message_detection() {
    assert!(is_result_message(&json!({"_type": "ResultMessage", "usage": {}})));
    assert!(!is_result_message(&json!({"_type": "AssistantMessage"})));
}

#[test]
fn from_payload_captures_role_and_preview() {
    let payload = json!({
        "_type": "AssistantMessage",
        "content": [{"_type": "TextBlock", "text": "hi there"}],
    });
    let msg = AgentMessage::from_payload("ses-9".into(), payload, 5_000);
    assert_eq!(msg.role, MessageRole::Assistant);
    assert_eq!(msg.text_preview.as_deref(), Some("hi there"));
    assert_eq!(msg.created_at_ms, 5_000);
}
