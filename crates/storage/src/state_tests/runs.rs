// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::apply_all;
use crate::state::MaterializedState;
use relay_core::{Event, Run, RunStatus};

#[test]
fn claim_sets_lease_from_event() {
    let mut state = MaterializedState::default();
    let run = Run::builder().build();
    let id = run.id;
    apply_all(
        &mut state,
        vec![
            Event::RunEnqueued { run },
            Event::RunClaimed {
                id,
                worker_id: "w2".into(),
                lease_expires_at_ms: 5_000,
                attempts: 2,
            },
        ],
    );
    let run = &state.runs[&id];
    assert_eq!(run.status, RunStatus::Claimed);
    assert_eq!(run.claimed_by.as_deref(), Some("w2"));
    assert_eq!(run.attempts, 2);
}

#[test]
fn started_records_first_start_only() {
    let mut state = MaterializedState::default();
    let run = Run::builder().build();
    let id = run.id;
    apply_all(
        &mut state,
        vec![
            Event::RunEnqueued { run },
            Event::RunStarted { id, at_ms: 10 },
            Event::RunStarted { id, at_ms: 20 },
        ],
    );
    assert_eq!(state.runs[&id].started_at_ms, Some(10));
    assert_eq!(state.runs[&id].status, RunStatus::Running);
}

#[test]
fn progress_clamps_and_ignores_terminal_runs() {
    let mut state = MaterializedState::default();
    let run = Run::builder().build();
    let id = run.id;
    apply_all(
        &mut state,
        vec![Event::RunEnqueued { run }, Event::RunProgress { id, progress: 250 }],
    );
    assert_eq!(state.runs[&id].progress, 100);

    apply_all(
        &mut state,
        vec![
            Event::RunFinished { id, status: RunStatus::Failed, error: None, at_ms: 50 },
            Event::RunProgress { id, progress: 10 },
        ],
    );
    assert_eq!(state.runs[&id].progress, 100);
}

#[test]
fn finished_records_error_and_clears_lease() {
    let mut state = MaterializedState::default();
    let run = Run::builder().claimed_by("w1").lease_expires_at_ms(99u64).build();
    let id = run.id;
    apply_all(
        &mut state,
        vec![
            Event::RunEnqueued { run },
            Event::RunFinished {
                id,
                status: RunStatus::Failed,
                error: Some("container start failed".into()),
                at_ms: 77,
            },
        ],
    );
    let run = &state.runs[&id];
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.last_error.as_deref(), Some("container start failed"));
    assert!(run.lease_expires_at_ms.is_none());
    assert_eq!(run.finished_at_ms, Some(77));
}

#[test]
fn started_after_finish_is_ignored() {
    let mut state = MaterializedState::default();
    let run = Run::builder().build();
    let id = run.id;
    apply_all(
        &mut state,
        vec![
            Event::RunEnqueued { run },
            Event::RunFinished { id, status: RunStatus::Canceled, error: None, at_ms: 5 },
            Event::RunStarted { id, at_ms: 6 },
        ],
    );
    assert_eq!(state.runs[&id].status, RunStatus::Canceled);
}
