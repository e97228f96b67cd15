// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The happy immediate run: enqueue → claim → running callbacks →
//! completion with usage.

use super::support::{deployment, WORKER};
use relay_core::{Callback, CallbackStatus, MessageRole, RunStatus, SessionStatus};
use serde_json::json;

#[test]
fn happy_immediate_run() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "hi");

    let grant = deployment.claim(WORKER, 30).expect("one queued run");
    assert_eq!(grant.run.run_id, outcome.run_id);
    assert_eq!(grant.prompt, "hi");
    assert_eq!(grant.run.attempts, 1);

    deployment
        .control
        .process_callback(Callback::status_only(
            outcome.session_id.as_str(),
            CallbackStatus::Running,
            10,
        ))
        .unwrap();
    assert_eq!(deployment.run(&outcome.run_id).status, RunStatus::Running);
    assert_eq!(deployment.run(&outcome.run_id).progress, 10);

    let mut with_text =
        Callback::status_only(outcome.session_id.as_str(), CallbackStatus::Running, 50);
    with_text.new_message = Some(json!({
        "_type": "AssistantMessage",
        "content": [{"_type": "TextBlock", "text": "hello"}],
    }));
    deployment.control.process_callback(with_text).unwrap();

    let mut done =
        Callback::status_only(outcome.session_id.as_str(), CallbackStatus::Completed, 100);
    done.new_message = Some(json!({
        "_type": "ResultMessage",
        "total_cost_usd": 0.001,
        "usage": {"input_tokens": 10, "output_tokens": 5},
        "content": [],
    }));
    deployment.control.process_callback(done).unwrap();

    let session = deployment.session(&outcome.session_id);
    assert_eq!(session.status, SessionStatus::Completed);

    let run = deployment.run(&outcome.run_id);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.progress, 100);
    assert!(run.finished_at_ms.is_some());
    assert!(run.claimed_by.is_none());

    deployment.control.store().read(|state| {
        let transcript = &state.messages[&outcome.session_id];
        // The user prompt plus the two callback messages.
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].role, MessageRole::User);
        assert_eq!(transcript[1].text_preview.as_deref(), Some("hello"));

        let usage = &state.usage_logs[&outcome.session_id];
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].total_cost_usd, 0.001);
        assert_eq!(usage[0].run_id, Some(outcome.run_id));
    });
}

#[test]
fn enqueue_claim_completion_is_a_closed_loop() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "round trip");
    assert_eq!(deployment.session(&outcome.session_id).status, SessionStatus::Pending);

    deployment.claim(WORKER, 30).expect("claimable");
    deployment
        .control
        .process_callback(Callback::status_only(
            outcome.session_id.as_str(),
            CallbackStatus::Completed,
            100,
        ))
        .unwrap();

    assert_eq!(deployment.session(&outcome.session_id).status, SessionStatus::Completed);
    assert_eq!(deployment.run(&outcome.run_id).status, RunStatus::Completed);
    assert_eq!(deployment.run(&outcome.run_id).progress, 100);

    // Nothing left to claim.
    assert!(deployment.claim("w2", 30).is_none());
}
