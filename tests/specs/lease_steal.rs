// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease recovery: a silently dead worker's run becomes claimable once
//! its lease expires, and only then.

use super::support::deployment;
use relay_core::RunStatus;
use std::time::Duration;

#[test]
fn expired_lease_is_stolen_with_attempt_bump() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "work");

    let grant = deployment.claim("w1", 30).expect("claim");
    assert_eq!(grant.run.claimed_by.as_deref(), Some("w1"));
    assert_eq!(grant.run.attempts, 1);

    // w1 dies silently. Before the lease expires, nobody can steal.
    deployment.clock.advance(Duration::from_secs(29));
    assert!(deployment.claim("w2", 30).is_none());

    // 30s after the claim the lease is up for grabs.
    deployment.clock.advance(Duration::from_secs(1));
    let stolen = deployment.claim("w2", 30).expect("steal");
    assert_eq!(stolen.run.run_id, outcome.run_id);
    assert_eq!(stolen.run.claimed_by.as_deref(), Some("w2"));
    assert_eq!(stolen.run.attempts, 2);

    let run = deployment.run(&outcome.run_id);
    assert_eq!(run.status, RunStatus::Claimed);
    assert_eq!(run.claimed_by.as_deref(), Some("w2"));
}

#[test]
fn running_run_with_expired_lease_is_also_recoverable() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "work");
    deployment.claim("w1", 30).expect("claim");
    deployment
        .control
        .start_run(
            &deployment.ctx("worker"),
            &outcome.run_id,
            relay_wire::RunStartRequest { worker_id: "w1".into() },
        )
        .unwrap();

    deployment.clock.advance(Duration::from_secs(31));
    let stolen = deployment.claim("w2", 30).expect("steal running run");
    assert_eq!(stolen.run.attempts, 2);
}

#[test]
fn two_workers_one_run_exactly_one_wins() {
    let deployment = deployment();
    deployment.enqueue("u1", "solo");

    let first = deployment.claim("w1", 30);
    let second = deployment.claim("w2", 30);
    assert!(first.is_some());
    assert!(second.is_none());
}
