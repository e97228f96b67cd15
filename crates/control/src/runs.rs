// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The run queue: claim under lease, start, fail.
//!
//! The claim decision runs inside one store transaction, which is the
//! system's single-owner guarantee: two concurrent claims cannot pick
//! the same run.

use crate::context::RequestCtx;
use crate::env::{env_bool, env_u32};
use crate::error::ControlError;
use crate::Control;
use chrono::{DateTime, Timelike, Utc};
use relay_core::{parse_blocks, Clock, ContentBlock, Event, Run, RunId, RunStatus, ScheduleMode};
use relay_wire::{RunClaimGrant, RunClaimRequest, RunFailRequest, RunStartRequest, RunView};

/// UTC window during which nightly runs are claimable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightlyWindow {
    pub start_hour: u32,
    pub start_minute: u32,
    pub window_minutes: u32,
}

impl NightlyWindow {
    /// Whether `now` falls inside `[start, start + window)`, handling
    /// windows that wrap past midnight.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let minute_of_day = now.hour() * 60 + now.minute();
        let start = self.start_hour * 60 + self.start_minute;
        let end = start + self.window_minutes;
        if end <= 24 * 60 {
            minute_of_day >= start && minute_of_day < end
        } else {
            minute_of_day >= start || minute_of_day < end % (24 * 60)
        }
    }
}

impl Default for NightlyWindow {
    fn default() -> Self {
        Self { start_hour: 2, start_minute: 0, window_minutes: 360 }
    }
}

/// Queue-side scheduling configuration.
#[derive(Debug, Clone, Default)]
pub struct QueueConfig {
    /// Absent means nightly runs are claimable at any time.
    pub nightly_window: Option<NightlyWindow>,
}

impl QueueConfig {
    pub fn with_nightly_window(window: NightlyWindow) -> Self {
        Self { nightly_window: Some(window) }
    }

    /// Read from `RELAY_TASK_PULL_NIGHTLY_*` environment variables.
    pub fn from_env() -> Self {
        if !env_bool("RELAY_TASK_PULL_NIGHTLY_ENABLED", true) {
            return Self::default();
        }
        Self::with_nightly_window(NightlyWindow {
            start_hour: env_u32("RELAY_TASK_PULL_NIGHTLY_START_HOUR", 2),
            start_minute: env_u32("RELAY_TASK_PULL_NIGHTLY_START_MINUTE", 0),
            window_minutes: env_u32("RELAY_TASK_PULL_NIGHTLY_WINDOW_MINUTES", 360),
        })
    }
}

impl<C: Clock> Control<C> {
    /// Claim the next eligible run for a worker. Returns None when
    /// nothing is claimable right now.
    pub fn claim_run(
        &self,
        _ctx: &RequestCtx,
        request: RunClaimRequest,
    ) -> Result<Option<RunClaimGrant>, ControlError> {
        let worker_id = request.worker_id.trim().to_string();
        if worker_id.is_empty() {
            return Err(ControlError::bad_request("worker_id cannot be empty"));
        }
        let lease_seconds = request.lease_seconds.max(5) as u64;
        let now = self.epoch_ms();
        let now_utc = self.clock.now_utc();
        let nightly_open = self
            .queue
            .nightly_window
            .map(|w| w.is_open(now_utc))
            .unwrap_or(true);

        self.store.transact(now, |state| {
            let candidate = state
                .runs
                .values()
                .filter(|run| run.is_claimable(now))
                .filter(|run| {
                    request
                        .schedule_modes
                        .as_deref()
                        .is_none_or(|modes| modes.contains(&run.schedule_mode))
                })
                .filter(|run| match run.schedule_mode {
                    ScheduleMode::Immediate => true,
                    ScheduleMode::Scheduled => {
                        run.scheduled_at_ms.is_some_and(|at| at <= now)
                    }
                    ScheduleMode::Nightly => nightly_open,
                })
                .filter(|run| {
                    state
                        .sessions
                        .get(&run.session_id)
                        .is_some_and(|session| !session.is_deleted)
                })
                .min_by_key(|run| (run.claim_order_key(), run.id));

            let Some(run) = candidate else {
                return Ok((Vec::new(), None));
            };

            let session = state
                .sessions
                .get(&run.session_id)
                .ok_or_else(|| ControlError::not_found("Session not found for run"))?;

            let lease_expires_at_ms = now + lease_seconds * 1_000;
            let attempts = run.attempts + 1;
            let events = vec![Event::RunClaimed {
                id: run.id,
                worker_id: worker_id.clone(),
                lease_expires_at_ms,
                attempts,
            }];

            // View over the post-claim run.
            let mut claimed = run.clone();
            claimed.claim(&worker_id, lease_expires_at_ms);
            claimed.attempts = attempts;

            let prompt = user_prompt_text(state, run);
            // Scheduled-task runs always start a fresh agent session.
            let sdk_session_id = if run.scheduled_task_id.is_some() {
                None
            } else {
                session.sdk_session_id.clone()
            };

            tracing::info!(
                run = %run.id,
                worker = %worker_id,
                attempts,
                mode = %run.schedule_mode,
                "run claimed"
            );

            Ok((
                events,
                Some(RunClaimGrant {
                    config_snapshot: claimed.config_snapshot.sanitized(),
                    run: RunView::from(&claimed),
                    user_id: session.user_id.clone(),
                    prompt,
                    sdk_session_id,
                }),
            ))
        })
    }

    /// `claimed → running`. The caller must still own the lease.
    pub fn start_run(
        &self,
        _ctx: &RequestCtx,
        run_id: &RunId,
        request: RunStartRequest,
    ) -> Result<RunView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let run = require_run(state, run_id)?;
            require_owner(run, &request.worker_id)?;
            if !matches!(run.status, RunStatus::Claimed | RunStatus::Running) {
                return Err(ControlError::conflict(format!(
                    "Run {run_id} is {} and cannot start",
                    run.status
                )));
            }

            let mut started = run.clone();
            started.status = RunStatus::Running;
            if started.started_at_ms.is_none() {
                started.started_at_ms = Some(now);
            }
            Ok((vec![Event::RunStarted { id: run.id, at_ms: now }], RunView::from(&started)))
        })
    }

    /// `{claimed, running} → failed`. Records the error, clears the
    /// lease, and (when this was the session's active run) fails the
    /// session so the UI stops waiting.
    pub fn fail_run(
        &self,
        _ctx: &RequestCtx,
        run_id: &RunId,
        request: RunFailRequest,
    ) -> Result<RunView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let run = require_run(state, run_id)?;
            require_owner(run, &request.worker_id)?;
            if !matches!(run.status, RunStatus::Claimed | RunStatus::Running) {
                return Err(ControlError::conflict(format!(
                    "Run {run_id} is {} and cannot fail",
                    run.status
                )));
            }

            let error = request
                .error_message
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from);

            let mut events = vec![Event::RunFinished {
                id: run.id,
                status: RunStatus::Failed,
                error: error.clone(),
                at_ms: now,
            }];

            if let Some(task_id) = run.scheduled_task_id {
                events.push(Event::ScheduledTaskRunMirrored {
                    id: task_id,
                    run_id: run.id,
                    status: RunStatus::Failed,
                    error: error.clone(),
                });
            }

            // Only the active run moves the session status.
            let is_active = state
                .latest_nonterminal_run(&run.session_id)
                .is_some_and(|latest| latest.id == run.id);
            if is_active {
                events.push(Event::SessionStatusChanged {
                    id: run.session_id,
                    status: relay_core::SessionStatus::Failed,
                    at_ms: now,
                });
            }

            let mut failed = run.clone();
            failed.finish(RunStatus::Failed, now);
            failed.last_error = error;

            tracing::warn!(
                run = %run.id,
                worker = %request.worker_id,
                error = failed.last_error.as_deref().unwrap_or(""),
                "run failed"
            );
            Ok((events, RunView::from(&failed)))
        })
    }
}

fn require_run<'a>(
    state: &'a relay_storage::MaterializedState,
    run_id: &RunId,
) -> Result<&'a Run, ControlError> {
    state
        .runs
        .get(run_id)
        .ok_or_else(|| ControlError::not_found(format!("Run not found: {run_id}")))
}

fn require_owner(run: &Run, worker_id: &str) -> Result<(), ControlError> {
    if run.claimed_by.as_deref() != Some(worker_id) {
        return Err(ControlError::conflict(format!(
            "Run {} is not owned by worker {worker_id}",
            run.id
        )));
    }
    Ok(())
}

/// Full text of the run's user message (the preview may be truncated).
fn user_prompt_text(state: &relay_storage::MaterializedState, run: &Run) -> String {
    let message = state
        .messages
        .get(&run.session_id)
        .and_then(|messages| messages.iter().find(|m| m.id == run.user_message_id));
    let Some(message) = message else { return String::new() };
    for block in parse_blocks(&message.content) {
        if let ContentBlock::Text { text } = block {
            return text;
        }
    }
    message.text_preview.clone().unwrap_or_default()
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
