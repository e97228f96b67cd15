// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run queue event handlers.

use super::MaterializedState;
use relay_core::{Event, RunStatus};

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::RunEnqueued { run } => {
            state.runs.insert(run.id, run.clone());
        }

        Event::RunClaimed { id, worker_id, lease_expires_at_ms, attempts } => {
            if let Some(run) = state.runs.get_mut(id) {
                run.status = RunStatus::Claimed;
                run.claimed_by = Some(worker_id.clone());
                run.lease_expires_at_ms = Some(*lease_expires_at_ms);
                // Attempt count is carried on the event so replay never
                // double-counts.
                run.attempts = *attempts;
            }
        }

        Event::RunStarted { id, at_ms } => {
            if let Some(run) = state.runs.get_mut(id) {
                if !run.is_terminal() {
                    run.status = RunStatus::Running;
                    if run.started_at_ms.is_none() {
                        run.started_at_ms = Some(*at_ms);
                    }
                }
            }
        }

        Event::RunProgress { id, progress } => {
            if let Some(run) = state.runs.get_mut(id) {
                if !run.is_terminal() {
                    run.progress = (*progress).min(100);
                }
            }
        }

        Event::RunFinished { id, status, error, at_ms } => {
            if let Some(run) = state.runs.get_mut(id) {
                run.finish(*status, *at_ms);
                if error.is_some() {
                    run.last_error = error.clone();
                }
            }
        }

        _ => {}
    }
}
