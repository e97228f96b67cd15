// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation racing completion: the cancel commits first, so the
//! late completion callback is discarded and everything stays canceled.

use super::support::{deployment, WORKER};
use relay_core::{tool_key, Callback, CallbackStatus, RunStatus, SessionStatus};
use relay_wire::CancelRequest;
use serde_json::json;
use std::time::Duration;

#[test]
fn cancel_beats_late_completion() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "long task");
    deployment.claim(WORKER, 30).expect("claim");

    // T=0: the executor reports running with an in-flight tool call.
    let mut running =
        Callback::status_only(outcome.session_id.as_str(), CallbackStatus::Running, 10);
    running.new_message = Some(json!({
        "_type": "AssistantMessage",
        "content": [
            {"_type": "ToolUseBlock", "id": "t1", "name": "Bash", "input": {"command": "sleep 99"}},
        ],
    }));
    deployment.control.process_callback(running).unwrap();

    // T=100ms: the user cancels.
    deployment.clock.advance(Duration::from_millis(100));
    let cancel = deployment
        .control
        .cancel_session(&deployment.ctx("u1"), &outcome.session_id, CancelRequest::default())
        .unwrap();
    assert_eq!(cancel.canceled_runs, 1);
    assert_eq!(cancel.canceled_tool_executions, 1);

    // T=200ms: the executor's completion arrives late.
    deployment.clock.advance(Duration::from_millis(100));
    let ack = deployment
        .control
        .process_callback(Callback::status_only(
            outcome.session_id.as_str(),
            CallbackStatus::Completed,
            100,
        ))
        .unwrap();
    assert_eq!(ack.status, "discarded");

    let session = deployment.session(&outcome.session_id);
    assert_eq!(session.status, SessionStatus::Canceled);
    assert_eq!(deployment.run(&outcome.run_id).status, RunStatus::Canceled);

    deployment.control.store().read(|state| {
        let tool = &state.tool_executions[&tool_key(&outcome.session_id, "t1")];
        assert!(tool.is_error);
        assert_eq!(tool.tool_output, Some(json!({"content": "Canceled"})));
    });
}

#[tokio::test]
async fn cancel_notifies_executor_through_the_relay() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "task");

    let grant = deployment.claim(WORKER, 30).expect("claim");
    deployment.puller.handle_claim(grant).await.expect("dispatch");

    // Local cancel on the control plane, then the best-effort executor
    // notification through the dispatcher.
    let mut cancel = deployment
        .control
        .cancel_session(
            &deployment.ctx("u1"),
            &outcome.session_id,
            CancelRequest { reason: Some("stop".into()) },
        )
        .unwrap();
    cancel.executor_notified =
        deployment.relay.cancel_executor(&outcome.session_id, Some("stop")).await;

    assert!(cancel.executor_notified);
    assert_eq!(deployment.executor.canceled.lock().len(), 1);
    assert!(deployment.pool.lookup(&outcome.session_id).is_none());
    assert_eq!(deployment.session(&outcome.session_id).status, SessionStatus::Canceled);
}

#[test]
fn local_cancel_succeeds_without_any_executor() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "never dispatched");

    let cancel = deployment
        .control
        .cancel_session(&deployment.ctx("u1"), &outcome.session_id, CancelRequest::default())
        .unwrap();
    assert!(!cancel.executor_notified);
    assert_eq!(deployment.session(&outcome.session_id).status, SessionStatus::Canceled);
    assert_eq!(deployment.run(&outcome.run_id).status, RunStatus::Canceled);
}

#[test]
fn canceled_scheduled_runs_never_fire() {
    let deployment = deployment();
    let outcome = deployment
        .control
        .enqueue_task(
            &deployment.ctx("u1"),
            relay_wire::TaskEnqueueRequest {
                prompt: "later".to_string(),
                schedule_mode: Some("scheduled".to_string()),
                scheduled_at: Some("1970-01-02T00:00:00Z".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    deployment
        .control
        .cancel_session(&deployment.ctx("u1"), &outcome.session_id, CancelRequest::default())
        .unwrap();

    // Even after the due time passes, the canceled run is unclaimable.
    deployment.clock.set_epoch_ms(3 * 24 * 3600 * 1000);
    assert!(deployment.claim(WORKER, 30).is_none());
}
