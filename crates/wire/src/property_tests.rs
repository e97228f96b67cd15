// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{CallbackAck, Envelope, ErrorKind, RunView, SessionView};
use proptest::prelude::*;
use relay_core::{Run, Session};

#[test]
fn envelope_ok_has_zero_code() {
    let env = Envelope::ok(42u32);
    assert!(env.is_ok());
    assert_eq!(env.data, Some(42));
}

#[test]
fn envelope_error_carries_kind_code() {
    let env: Envelope<()> = Envelope::error(ErrorKind::NotFound, "Session not found: ses-1");
    assert!(!env.is_ok());
    assert_eq!(env.code, 40400);
    assert_eq!(env.message, "Session not found: ses-1");
    assert!(env.data.is_none());
}

#[test]
fn error_codes_are_unique() {
    let kinds = [
        ErrorKind::BadRequest,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::ExternalServiceUnavailable,
        ErrorKind::CallbackForwardFailed,
        ErrorKind::StorageError,
        ErrorKind::WorkspaceNotFound,
        ErrorKind::ContainerStartFailed,
        ErrorKind::Internal,
    ];
    let codes: std::collections::HashSet<u32> = kinds.iter().map(|k| k.code()).collect();
    assert_eq!(codes.len(), kinds.len());
}

#[test]
fn session_view_sanitizes_mcp_config() {
    let mut session = Session::builder().build();
    session
        .config_snapshot
        .insert("mcp_config", serde_json::json!({"mcpServers": {"gh": {}}}));
    session.config_snapshot.insert("repo_url", serde_json::json!("https://example.com/r"));

    let view = SessionView::from(&session);
    assert!(view.config_snapshot.get("mcp_config").is_none());
    assert!(view.config_snapshot.get("repo_url").is_some());
}

#[test]
fn run_view_round_trips_through_json() {
    let run = Run::builder().claimed_by("w1").lease_expires_at_ms(5u64).attempts(3).build();
    let view = RunView::from(&run);
    let json = serde_json::to_string(&view).unwrap();
    let parsed: RunView = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, view);
}

#[test]
fn callback_ack_received_shape() {
    let ack = CallbackAck::received("sdk-1");
    let json = serde_json::to_value(&ack).unwrap();
    assert_eq!(json["status"], "received");
    assert_eq!(json["session_id"], "sdk-1");
}

proptest! {
    #[test]
    fn envelope_round_trips(code in 0u32..60000, message in ".{0,40}", data in proptest::option::of(0u64..u64::MAX)) {
        let env = Envelope { code, message, data };
        let json = serde_json::to_string(&env).unwrap();
        let parsed: Envelope<u64> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, env);
    }

    #[test]
    fn error_kind_serde_round_trips(idx in 0usize..11) {
        let kinds = [
            ErrorKind::BadRequest,
            ErrorKind::Unauthorized,
            ErrorKind::Forbidden,
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::ExternalServiceUnavailable,
            ErrorKind::CallbackForwardFailed,
            ErrorKind::StorageError,
            ErrorKind::WorkspaceNotFound,
            ErrorKind::ContainerStartFailed,
            ErrorKind::Internal,
        ];
        let kind = kinds[idx];
        let json = serde_json::to_string(&kind).unwrap();
        let parsed: ErrorKind = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, kind);
    }
}
