// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{ctx, fixture, fixture_with_queue};
use crate::ControlError;
use chrono::TimeZone;
use relay_wire::TaskEnqueueRequest;
use std::time::Duration;

fn claim_request(worker: &str) -> RunClaimRequest {
    RunClaimRequest { worker_id: worker.to_string(), lease_seconds: 30, schedule_modes: None }
}

fn enqueue(fx: &crate::test_support::Fixture, user: &str, prompt: &str) -> relay_wire::TaskEnqueueOutcome {
    fx.control
        .enqueue_task(&ctx(user), TaskEnqueueRequest { prompt: prompt.to_string(), ..Default::default() })
        .unwrap()
}

#[test]
fn claim_returns_queued_run_with_prompt() {
    let fx = fixture();
    let outcome = enqueue(&fx, "u1", "do the thing");

    let grant = fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().unwrap();
    assert_eq!(grant.run.run_id, outcome.run_id);
    assert_eq!(grant.run.status, RunStatus::Claimed);
    assert_eq!(grant.run.claimed_by.as_deref(), Some("w1"));
    assert_eq!(grant.run.attempts, 1);
    assert_eq!(grant.user_id, "u1");
    assert_eq!(grant.prompt, "do the thing");
    assert!(grant.sdk_session_id.is_none());
}

#[test]
fn empty_queue_claims_nothing() {
    let fx = fixture();
    assert!(fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().is_none());
}

#[test]
fn second_claim_sees_nothing_while_lease_lives() {
    let fx = fixture();
    enqueue(&fx, "u1", "hi");
    assert!(fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().is_some());
    assert!(fx.control.claim_run(&ctx("w"), claim_request("w2")).unwrap().is_none());
}

#[test]
fn expired_lease_allows_steal_with_attempt_bump() {
    let fx = fixture();
    let outcome = enqueue(&fx, "u1", "hi");
    fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().unwrap();

    fx.clock.advance(Duration::from_secs(31));
    let grant = fx.control.claim_run(&ctx("w"), claim_request("w2")).unwrap().unwrap();
    assert_eq!(grant.run.run_id, outcome.run_id);
    assert_eq!(grant.run.claimed_by.as_deref(), Some("w2"));
    assert_eq!(grant.run.attempts, 2);
}

#[test]
fn claim_respects_schedule_mode_filter() {
    let fx = fixture();
    enqueue(&fx, "u1", "immediate job");

    let filtered = RunClaimRequest {
        worker_id: "w1".to_string(),
        lease_seconds: 30,
        schedule_modes: Some(vec![ScheduleMode::Nightly]),
    };
    assert!(fx.control.claim_run(&ctx("w"), filtered).unwrap().is_none());
    assert!(fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().is_some());
}

#[test]
fn scheduled_runs_wait_for_due_time() {
    let fx = fixture();
    let mut request = TaskEnqueueRequest { prompt: "later".to_string(), ..Default::default() };
    request.schedule_mode = Some("scheduled".to_string());
    // FakeClock starts at epoch_ms 1_000_000.
    request.scheduled_at = Some("1970-01-01T02:00:00Z".to_string());
    fx.control.enqueue_task(&ctx("u1"), request).unwrap();

    assert!(fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().is_none());

    fx.clock.set_epoch_ms(2 * 3600 * 1000 + 1);
    assert!(fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().is_some());
}

#[test]
fn claim_orders_by_due_time_then_arrival() {
    let fx = fixture();
    let first = enqueue(&fx, "u1", "first");
    fx.clock.advance(Duration::from_secs(1));
    let second = enqueue(&fx, "u1", "second");

    let grant = fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().unwrap();
    assert_eq!(grant.run.run_id, first.run_id);
    let grant = fx.control.claim_run(&ctx("w"), claim_request("w2")).unwrap().unwrap();
    assert_eq!(grant.run.run_id, second.run_id);
}

#[test]
fn nightly_claims_only_inside_window() {
    let fx = fixture_with_queue(QueueConfig::with_nightly_window(NightlyWindow {
        start_hour: 2,
        start_minute: 0,
        window_minutes: 360,
    }));
    let mut request = TaskEnqueueRequest { prompt: "nightly".to_string(), ..Default::default() };
    request.schedule_mode = Some("nightly".to_string());
    fx.control.enqueue_task(&ctx("u1"), request).unwrap();

    let at = |h: u32, m: u32| {
        chrono::Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).single().unwrap().timestamp_millis()
            as u64
    };

    fx.clock.set_epoch_ms(at(1, 59));
    assert!(fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().is_none());

    fx.clock.set_epoch_ms(at(2, 1));
    let grant = fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap();
    assert!(grant.is_some());
}

#[test]
fn nightly_window_closes_again() {
    let fx = fixture_with_queue(QueueConfig::with_nightly_window(NightlyWindow::default()));
    let mut request = TaskEnqueueRequest { prompt: "nightly".to_string(), ..Default::default() };
    request.schedule_mode = Some("nightly".to_string());
    fx.control.enqueue_task(&ctx("u1"), request).unwrap();

    let at_801 = chrono::Utc
        .with_ymd_and_hms(2024, 6, 1, 8, 1, 0)
        .single()
        .unwrap()
        .timestamp_millis() as u64;
    fx.clock.set_epoch_ms(at_801);
    assert!(fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().is_none());
}

#[test]
fn start_requires_owning_worker() {
    let fx = fixture();
    let outcome = enqueue(&fx, "u1", "hi");
    fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().unwrap();

    let err = fx
        .control
        .start_run(&ctx("w"), &outcome.run_id, RunStartRequest { worker_id: "w2".into() })
        .unwrap_err();
    assert!(matches!(err, ControlError::Conflict(_)));

    let view = fx
        .control
        .start_run(&ctx("w"), &outcome.run_id, RunStartRequest { worker_id: "w1".into() })
        .unwrap();
    assert_eq!(view.status, RunStatus::Running);
    assert!(view.started_at_ms.is_some());
}

#[test]
fn fail_records_error_and_fails_session() {
    let fx = fixture();
    let outcome = enqueue(&fx, "u1", "hi");
    fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().unwrap();

    let view = fx
        .control
        .fail_run(
            &ctx("w"),
            &outcome.run_id,
            RunFailRequest {
                worker_id: "w1".into(),
                error_message: Some("container start failed".into()),
            },
        )
        .unwrap();
    assert_eq!(view.status, RunStatus::Failed);
    assert_eq!(view.last_error.as_deref(), Some("container start failed"));

    fx.control.store().read(|state| {
        let run = &state.runs[&outcome.run_id];
        assert!(run.claimed_by.is_none());
        assert!(run.lease_expires_at_ms.is_none());
        assert_eq!(
            state.sessions[&outcome.session_id].status,
            relay_core::SessionStatus::Failed
        );
    });
}

#[test]
fn fail_rejects_queued_run() {
    let fx = fixture();
    let outcome = enqueue(&fx, "u1", "hi");
    let err = fx
        .control
        .fail_run(
            &ctx("w"),
            &outcome.run_id,
            RunFailRequest { worker_id: "w1".into(), error_message: None },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::Conflict(_)));
}

#[test]
fn nightly_window_wraps_midnight() {
    let window = NightlyWindow { start_hour: 23, start_minute: 0, window_minutes: 120 };
    let at = |h: u32, m: u32| chrono::Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).single().unwrap();
    assert!(window.is_open(at(23, 30)));
    assert!(window.is_open(at(0, 30)));
    assert!(!window.is_open(at(1, 0)));
    assert!(!window.is_open(at(22, 59)));
}

#[test]
fn canceled_runs_are_not_claimable() {
    let fx = fixture();
    let outcome = enqueue(&fx, "u1", "hi");
    fx.control
        .cancel_session(&ctx("u1"), &outcome.session_id, relay_wire::CancelRequest::default())
        .unwrap();
    assert!(fx.control.claim_run(&ctx("w"), claim_request("w1")).unwrap().is_none());
}
