// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool result arriving before its use block: the two merge into a
//! single completed execution.

use super::support::{deployment, WORKER};
use relay_core::{tool_key, Callback, CallbackStatus};
use serde_json::json;

#[test]
fn result_before_use_merges_into_one_execution() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "odd batching");
    deployment.claim(WORKER, 30).expect("claim");

    // Callback A: the result shows up first.
    let mut result_first =
        Callback::status_only(outcome.session_id.as_str(), CallbackStatus::Running, 30);
    result_first.new_message = Some(json!({
        "_type": "UserMessage",
        "content": [
            {"_type": "ToolResultBlock", "tool_use_id": "t1", "content": "file body", "is_error": false},
        ],
    }));
    deployment.control.process_callback(result_first).unwrap();

    // Callback B: the use block follows.
    let mut use_second =
        Callback::status_only(outcome.session_id.as_str(), CallbackStatus::Running, 40);
    use_second.new_message = Some(json!({
        "_type": "AssistantMessage",
        "content": [
            {"_type": "ToolUseBlock", "id": "t1", "name": "Read", "input": {"path": "/f"}},
        ],
    }));
    deployment.control.process_callback(use_second).unwrap();

    deployment.control.store().read(|state| {
        let executions = state.tool_executions_for_session(&outcome.session_id);
        assert_eq!(executions.len(), 1);
        let execution = executions[0];
        assert_eq!(execution.tool_name, "Read");
        assert_eq!(execution.tool_input, Some(json!({"path": "/f"})));
        assert_eq!(execution.tool_output, Some(json!({"content": "file body"})));
        assert!(!execution.is_error);
    });
}

#[test]
fn orphan_results_keep_the_unknown_placeholder() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "lost use");
    deployment.claim(WORKER, 30).expect("claim");

    let mut orphan =
        Callback::status_only(outcome.session_id.as_str(), CallbackStatus::Running, 30);
    orphan.new_message = Some(json!({
        "_type": "UserMessage",
        "content": [
            {"_type": "ToolResultBlock", "tool_use_id": "t9", "content": null, "is_error": true},
        ],
    }));
    deployment.control.process_callback(orphan).unwrap();

    deployment.control.store().read(|state| {
        let tool = &state.tool_executions[&tool_key(&outcome.session_id, "t9")];
        assert_eq!(tool.tool_name, "unknown");
        assert!(tool.is_error);
        // Null content still closes the execution.
        assert_eq!(tool.tool_output, Some(json!({"content": null})));
    });
}
