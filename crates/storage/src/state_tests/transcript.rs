// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::apply_all;
use crate::state::MaterializedState;
use relay_core::{tool_key, AgentMessage, Event, ToolExecutionId, UsageLog, UserInputRequest};
use serde_json::json;

#[test]
fn messages_keep_append_order() {
    let mut state = MaterializedState::default();
    let session_id = relay_core::SessionId::from_string("ses-1");
    apply_all(
        &mut state,
        vec![
            Event::MessageAppended {
                message: AgentMessage::user_prompt(session_id, "first", 1),
            },
            Event::MessageAppended {
                message: AgentMessage::user_prompt(session_id, "second", 2),
            },
        ],
    );
    let transcript = &state.messages[&session_id];
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].text_preview.as_deref(), Some("first"));
    assert_eq!(transcript[1].text_preview.as_deref(), Some("second"));
}

#[test]
fn tool_use_then_result() {
    let mut state = MaterializedState::default();
    let session_id = relay_core::SessionId::from_string("ses-1");
    apply_all(
        &mut state,
        vec![
            Event::ToolUseRecorded {
                id: ToolExecutionId::new(),
                session_id,
                message_id: "msg-1".into(),
                tool_use_id: "t1".into(),
                tool_name: "Read".into(),
                tool_input: Some(json!({"path": "/f"})),
                at_ms: 100,
            },
            Event::ToolResultRecorded {
                id: ToolExecutionId::new(),
                session_id,
                result_message_id: "msg-2".into(),
                tool_use_id: "t1".into(),
                content: Some(json!("contents")),
                is_error: false,
                at_ms: 350,
            },
        ],
    );
    let execution = &state.tool_executions[&tool_key(&session_id, "t1")];
    assert_eq!(execution.tool_name, "Read");
    assert_eq!(execution.tool_output, Some(json!({"content": "contents"})));
    assert_eq!(execution.duration_ms, Some(250));
    assert!(!execution.is_error);
}

#[test]
fn tool_result_before_use_upgrades_placeholder() {
    let mut state = MaterializedState::default();
    let session_id = relay_core::SessionId::from_string("ses-1");
    apply_all(
        &mut state,
        vec![
            Event::ToolResultRecorded {
                id: ToolExecutionId::new(),
                session_id,
                result_message_id: "msg-2".into(),
                tool_use_id: "t1".into(),
                content: Some(json!("out")),
                is_error: false,
                at_ms: 100,
            },
            Event::ToolUseRecorded {
                id: ToolExecutionId::new(),
                session_id,
                message_id: "msg-3".into(),
                tool_use_id: "t1".into(),
                tool_name: "Read".into(),
                tool_input: Some(json!({"path": "/f"})),
                at_ms: 150,
            },
        ],
    );
    assert_eq!(state.tool_executions.len(), 1);
    let execution = &state.tool_executions[&tool_key(&session_id, "t1")];
    assert_eq!(execution.tool_name, "Read");
    assert_eq!(execution.tool_input, Some(json!({"path": "/f"})));
    assert_eq!(execution.tool_output, Some(json!({"content": "out"})));
    assert!(!execution.is_error);
}

#[test]
fn tool_cancel_only_touches_unfinished() {
    let mut state = MaterializedState::default();
    let session_id = relay_core::SessionId::from_string("ses-1");
    apply_all(
        &mut state,
        vec![
            Event::ToolUseRecorded {
                id: ToolExecutionId::new(),
                session_id,
                message_id: "msg-1".into(),
                tool_use_id: "open".into(),
                tool_name: "Bash".into(),
                tool_input: None,
                at_ms: 100,
            },
            Event::ToolUseRecorded {
                id: ToolExecutionId::new(),
                session_id,
                message_id: "msg-1".into(),
                tool_use_id: "done".into(),
                tool_name: "Read".into(),
                tool_input: None,
                at_ms: 100,
            },
            Event::ToolResultRecorded {
                id: ToolExecutionId::new(),
                session_id,
                result_message_id: "msg-2".into(),
                tool_use_id: "done".into(),
                content: Some(json!("ok")),
                is_error: false,
                at_ms: 200,
            },
            Event::ToolCanceled {
                session_id,
                tool_use_id: "open".into(),
                reason: Some("stop".into()),
                at_ms: 300,
            },
            Event::ToolCanceled {
                session_id,
                tool_use_id: "done".into(),
                reason: Some("stop".into()),
                at_ms: 300,
            },
        ],
    );
    let open = &state.tool_executions[&tool_key(&session_id, "open")];
    assert!(open.is_error);
    assert_eq!(open.tool_output, Some(json!({"content": "Canceled: stop"})));

    let done = &state.tool_executions[&tool_key(&session_id, "done")];
    assert!(!done.is_error);
    assert_eq!(done.tool_output, Some(json!({"content": "ok"})));
}

#[test]
fn usage_and_input_requests() {
    let mut state = MaterializedState::default();
    let session_id = relay_core::SessionId::from_string("ses-1");
    let request = UserInputRequest::builder().session_id(session_id).build();
    let request_id = request.id;
    apply_all(
        &mut state,
        vec![
            Event::UsageRecorded {
                usage: UsageLog::from_result_message(
                    session_id,
                    None,
                    &json!({"_type": "ResultMessage", "usage": {"input_tokens": 3}}),
                    1_000,
                )
                .unwrap(),
            },
            Event::InputRequestCreated { request },
            Event::InputRequestAnswered { id: request_id, answer: json!("yes") },
        ],
    );
    assert_eq!(state.usage_logs[&session_id].len(), 1);
    let request = &state.input_requests[&request_id];
    assert_eq!(request.status, relay_core::InputRequestStatus::Answered);
    assert_eq!(request.answer, Some(json!("yes")));
}
