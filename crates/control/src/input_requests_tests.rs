// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_support::{ctx, fixture, Fixture};
use crate::ControlError;
use relay_core::{InputRequestStatus, SessionId};
use relay_wire::{
    InputRequestAnswerRequest, InputRequestCreateRequest, SessionCreateRequest,
};
use serde_json::json;

fn session(fx: &Fixture, user: &str) -> SessionId {
    fx.control.create_session(&ctx(user), SessionCreateRequest::default()).unwrap().session_id
}

#[test]
fn create_and_answer_round_trip() {
    let fx = fixture();
    let session_id = session(&fx, "u1");

    let created = fx
        .control
        .create_input_request(InputRequestCreateRequest {
            session_id: session_id.to_string(),
            payload: json!({"question": "Proceed?", "options": ["yes", "no"]}),
            ttl_seconds: None,
        })
        .unwrap();
    assert_eq!(created.status, InputRequestStatus::Pending);

    let answered = fx
        .control
        .answer_input_request(
            &ctx("u1"),
            &created.id,
            InputRequestAnswerRequest { answer: json!("yes") },
        )
        .unwrap();
    assert_eq!(answered.status, InputRequestStatus::Answered);
    assert_eq!(answered.answer, Some(json!("yes")));

    // The dispatcher polls and sees the answer.
    let polled = fx.control.get_input_request(&created.id).unwrap();
    assert_eq!(polled.status, InputRequestStatus::Answered);
}

#[test]
fn create_accepts_sdk_session_id() {
    let fx = fixture();
    let session_id = session(&fx, "u1");
    fx.control
        .update_session(
            &ctx("u1"),
            &session_id,
            relay_wire::SessionUpdateRequest {
                sdk_session_id: Some("sdk-io".into()),
                ..Default::default()
            },
        )
        .unwrap();

    let created = fx
        .control
        .create_input_request(InputRequestCreateRequest {
            session_id: "sdk-io".into(),
            payload: json!({}),
            ttl_seconds: None,
        })
        .unwrap();
    assert_eq!(created.session_id, session_id);
}

#[test]
fn get_expires_lazily_after_deadline() {
    let fx = fixture();
    let session_id = session(&fx, "u1");
    let created = fx
        .control
        .create_input_request(InputRequestCreateRequest {
            session_id: session_id.to_string(),
            payload: json!({}),
            ttl_seconds: Some(10),
        })
        .unwrap();

    fx.clock.advance(std::time::Duration::from_secs(11));
    let fetched = fx.control.get_input_request(&created.id).unwrap();
    assert_eq!(fetched.status, InputRequestStatus::Expired);

    let err = fx
        .control
        .answer_input_request(
            &ctx("u1"),
            &created.id,
            InputRequestAnswerRequest { answer: json!("late") },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::Conflict(_)));
}

#[test]
fn answering_requires_session_ownership() {
    let fx = fixture();
    let session_id = session(&fx, "u1");
    let created = fx
        .control
        .create_input_request(InputRequestCreateRequest {
            session_id: session_id.to_string(),
            payload: json!({}),
            ttl_seconds: None,
        })
        .unwrap();

    let err = fx
        .control
        .answer_input_request(
            &ctx("u2"),
            &created.id,
            InputRequestAnswerRequest { answer: json!("nope") },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::Forbidden(_)));
}

#[test]
fn create_rejects_canceled_session() {
    let fx = fixture();
    let session_id = session(&fx, "u1");
    fx.control
        .cancel_session(&ctx("u1"), &session_id, relay_wire::CancelRequest::default())
        .unwrap();

    let err = fx
        .control
        .create_input_request(InputRequestCreateRequest {
            session_id: session_id.to_string(),
            payload: json!({}),
            ttl_seconds: None,
        })
        .unwrap_err();
    assert!(matches!(err, ControlError::Conflict(_)));
}

#[test]
fn pending_listing_for_session() {
    let fx = fixture();
    let session_id = session(&fx, "u1");
    fx.control
        .create_input_request(InputRequestCreateRequest {
            session_id: session_id.to_string(),
            payload: json!({"q": 1}),
            ttl_seconds: None,
        })
        .unwrap();

    let pending =
        fx.control.list_pending_input_requests(&ctx("u1"), &session_id).unwrap();
    assert_eq!(pending.len(), 1);
}
