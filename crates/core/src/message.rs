// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transcript messages and executor content-block parsing.
//!
//! Executor payloads tag messages and blocks with `_type` strings
//! ("AssistantMessage", "ToolUseBlock", ...). The raw JSON is persisted
//! verbatim; parsing extracts the role, a text preview, and the tool
//! blocks the callback processor acts on.

use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a transcript message.
    pub struct MessageId("msg-");
}

/// Maximum characters kept in a message text preview.
pub const TEXT_PREVIEW_MAX: usize = 500;

/// Role extracted from the message `_type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

crate::simple_display! {
    MessageRole {
        User => "user",
        Assistant => "assistant",
        System => "system",
    }
}

/// One message in a session's transcript. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: MessageRole,
    /// The executor's message payload, stored verbatim.
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_preview: Option<String>,
    pub created_at_ms: u64,
}

impl AgentMessage {
    /// Build a user message wrapping a prompt the way the executor
    /// serializes its own messages.
    pub fn user_prompt(session_id: SessionId, prompt: &str, epoch_ms: u64) -> Self {
        let content = serde_json::json!({
            "_type": "UserMessage",
            "content": [{"_type": "TextBlock", "text": prompt}],
        });
        Self {
            id: MessageId::new(),
            session_id,
            role: MessageRole::User,
            content,
            text_preview: Some(truncate_chars(prompt, TEXT_PREVIEW_MAX)),
            created_at_ms: epoch_ms,
        }
    }

    /// Wrap an executor-emitted message payload.
    pub fn from_payload(session_id: SessionId, payload: Value, epoch_ms: u64) -> Self {
        let role = extract_role(&payload);
        let preview = text_preview(&payload);
        Self {
            id: MessageId::new(),
            session_id,
            role,
            content: payload,
            text_preview: preview,
            created_at_ms: epoch_ms,
        }
    }
}

/// A parsed content block. Unknown block tags are skipped by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Option<Value>,
    },
    ToolResult {
        tool_use_id: String,
        content: Option<Value>,
        is_error: bool,
    },
}

impl ContentBlock {
    /// Parse a single block by its `_type` tag. Matching is by tag
    /// containment, mirroring the executor's serializer which emits
    /// module-qualified names.
    pub fn from_value(block: &Value) -> Option<Self> {
        let tag = block.get("_type").and_then(Value::as_str)?;
        if tag.contains("TextBlock") {
            let text = block.get("text").and_then(Value::as_str)?.to_string();
            return Some(ContentBlock::Text { text });
        }
        if tag.contains("ToolUseBlock") {
            let id = non_empty_str(block.get("id"))?;
            let name = non_empty_str(block.get("name"))?;
            return Some(ContentBlock::ToolUse {
                id,
                name,
                input: block.get("input").filter(|v| !v.is_null()).cloned(),
            });
        }
        if tag.contains("ToolResultBlock") {
            let tool_use_id = non_empty_str(block.get("tool_use_id"))?;
            return Some(ContentBlock::ToolResult {
                tool_use_id,
                content: block.get("content").filter(|v| !v.is_null()).cloned(),
                is_error: block.get("is_error").and_then(Value::as_bool).unwrap_or(false),
            });
        }
        None
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

/// Parse every recognizable block in a message payload.
pub fn parse_blocks(message: &Value) -> Vec<ContentBlock> {
    let Some(blocks) = message.get("content").and_then(Value::as_array) else {
        return Vec::new();
    };
    blocks.iter().filter_map(ContentBlock::from_value).collect()
}

/// Extract the role from a message `_type` tag.
///
/// Unknown tags fall back to `assistant` and log, so a new executor
/// message kind degrades gracefully instead of dropping the transcript.
pub fn extract_role(message: &Value) -> MessageRole {
    let tag = message.get("_type").and_then(Value::as_str).unwrap_or("");
    if tag.contains("AssistantMessage") || tag.contains("ResultMessage") {
        MessageRole::Assistant
    } else if tag.contains("UserMessage") {
        MessageRole::User
    } else if tag.contains("SystemMessage") {
        MessageRole::System
    } else {
        tracing::warn!(message_type = tag, "unknown message type, defaulting to assistant");
        MessageRole::Assistant
    }
}

/// First text block's text, truncated to [`TEXT_PREVIEW_MAX`] characters.
pub fn text_preview(message: &Value) -> Option<String> {
    for block in parse_blocks(message) {
        if let ContentBlock::Text { text } = block {
            return Some(truncate_chars(&text, TEXT_PREVIEW_MAX));
        }
    }
    None
}

/// True when the payload is a `ResultMessage` (end-of-run summary).
pub fn is_result_message(message: &Value) -> bool {
    message
        .get("_type")
        .and_then(Value::as_str)
        .is_some_and(|tag| tag.contains("ResultMessage"))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
