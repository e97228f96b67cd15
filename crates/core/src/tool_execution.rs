// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool execution records.
//!
//! Keyed by `(session_id, tool_use_id)`; a result block may arrive before
//! its use block (the executor batches oddly sometimes), so the record
//! supports being born as a placeholder and filled in later.

use crate::message::MessageId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a tool execution record.
    pub struct ToolExecutionId("tex-");
}

/// Placeholder tool name used when a result arrives before its use block.
pub const UNKNOWN_TOOL_NAME: &str = "unknown";

/// Composite state key for the `(session_id, tool_use_id)` uniqueness rule.
pub fn tool_key(session_id: &SessionId, tool_use_id: &str) -> String {
    format!("{}/{}", session_id, tool_use_id)
}

/// One tool invocation by the agent.
///
/// `tool_output == None` means in-flight from the UI's perspective; the
/// output is set even when the result content is empty, since that is the
/// "done" signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecution {
    pub id: ToolExecutionId,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    pub tool_use_id: String,
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message_id: Option<MessageId>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub created_at_ms: u64,
}

impl ToolExecution {
    /// Record a tool use block.
    pub fn from_use(
        session_id: SessionId,
        message_id: MessageId,
        tool_use_id: impl Into<String>,
        tool_name: impl Into<String>,
        tool_input: Option<Value>,
        epoch_ms: u64,
    ) -> Self {
        Self {
            id: ToolExecutionId::new(),
            session_id,
            message_id: Some(message_id),
            tool_use_id: tool_use_id.into(),
            tool_name: tool_name.into(),
            tool_input,
            tool_output: None,
            result_message_id: None,
            is_error: false,
            duration_ms: None,
            created_at_ms: epoch_ms,
        }
    }

    /// Record a result that arrived before its use block.
    pub fn placeholder_from_result(
        session_id: SessionId,
        result_message_id: MessageId,
        tool_use_id: impl Into<String>,
        output: Option<Value>,
        is_error: bool,
        epoch_ms: u64,
    ) -> Self {
        Self {
            id: ToolExecutionId::new(),
            session_id,
            message_id: None,
            tool_use_id: tool_use_id.into(),
            tool_name: UNKNOWN_TOOL_NAME.to_string(),
            tool_input: None,
            tool_output: Some(wrap_output(output)),
            result_message_id: Some(result_message_id),
            is_error,
            duration_ms: None,
            created_at_ms: epoch_ms,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.tool_output.is_some()
    }

    /// Apply a result block. Duration is computed once, from creation to
    /// the first result.
    pub fn complete(
        &mut self,
        result_message_id: MessageId,
        output: Option<Value>,
        is_error: bool,
        epoch_ms: u64,
    ) {
        self.tool_output = Some(wrap_output(output));
        self.result_message_id = Some(result_message_id);
        self.is_error = is_error;
        if self.duration_ms.is_none() {
            self.duration_ms = Some(epoch_ms.saturating_sub(self.created_at_ms));
        }
    }

    /// Force-terminate an in-flight execution on session cancel.
    pub fn cancel(&mut self, reason: Option<&str>, epoch_ms: u64) {
        let suffix = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => format!(": {r}"),
            None => String::new(),
        };
        self.is_error = true;
        self.tool_output = Some(serde_json::json!({ "content": format!("Canceled{suffix}") }));
        if self.duration_ms.is_none() {
            self.duration_ms = Some(epoch_ms.saturating_sub(self.created_at_ms));
        }
    }
}

/// The persisted output is always `{"content": ...}` so the UI has a
/// stable shape even for empty results.
fn wrap_output(content: Option<Value>) -> Value {
    serde_json::json!({ "content": content.unwrap_or(Value::Null) })
}

crate::builder! {
    pub struct ToolExecutionBuilder => ToolExecution {
        into {
            id: ToolExecutionId = "tex-test",
            session_id: SessionId = "ses-test",
            tool_use_id: String = "toolu_1",
            tool_name: String = "Read",
        }
        set {
            is_error: bool = false,
            created_at_ms: u64 = 1_000_000,
        }
        option {
            message_id: MessageId = None,
            tool_input: Value = None,
            tool_output: Value = None,
            result_message_id: MessageId = None,
            duration_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "tool_execution_tests.rs"]
mod tests;
