// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session management: create/read/update/list, soft delete, transcript
//! queries, and cancellation.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{
    Clock, Event, ProjectId, Session, SessionConfig, SessionId, SessionStatus,
    WorkspaceExportStatus,
};
use relay_wire::{
    CancelOutcome, CancelRequest, MessageView, SessionCreateRequest, SessionListQuery,
    SessionStateView, SessionUpdateRequest, SessionView, ToolExecutionView, UsageLogView,
};

const DEFAULT_LIST_LIMIT: usize = 100;

impl<C: Clock> Control<C> {
    pub fn create_session(
        &self,
        ctx: &RequestCtx,
        request: SessionCreateRequest,
    ) -> Result<SessionView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            if let Some(project_id) = request.project_id {
                require_project(state, &project_id, &ctx.user_id)?;
            }

            let snapshot = crate::tasks::build_config_snapshot(
                state,
                &ctx.user_id,
                request.config.as_ref(),
                &relay_core::ConfigSnapshot::default(),
            );
            let mut config = SessionConfig::new(ctx.user_id.clone())
                .config_snapshot(snapshot)
                .kind(request.kind.unwrap_or_else(|| "chat".to_string()));
            config.project_id = request.project_id;

            let session = Session::new_with_epoch_ms(config, now);
            tracing::info!(session = %session.id, user = %ctx.user_id, "session created");
            let view = SessionView::from(&session);
            Ok((vec![Event::SessionCreated { session }], view))
        })
    }

    pub fn get_session(
        &self,
        _ctx: &RequestCtx,
        session_id: &SessionId,
    ) -> Result<SessionView, ControlError> {
        self.store.read(|state| {
            state
                .sessions
                .get(session_id)
                .map(SessionView::from)
                .ok_or_else(|| ControlError::not_found(format!("Session not found: {session_id}")))
        })
    }

    pub fn session_state(
        &self,
        _ctx: &RequestCtx,
        session_id: &SessionId,
    ) -> Result<SessionStateView, ControlError> {
        self.store.read(|state| {
            state
                .sessions
                .get(session_id)
                .map(SessionStateView::from)
                .ok_or_else(|| ControlError::not_found(format!("Session not found: {session_id}")))
        })
    }

    pub fn list_sessions(
        &self,
        ctx: &RequestCtx,
        query: SessionListQuery,
    ) -> Result<Vec<SessionView>, ControlError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        let offset = query.offset.unwrap_or(0);
        Ok(self.store.read(|state| {
            let mut sessions: Vec<&Session> = state
                .sessions
                .values()
                .filter(|s| !s.is_deleted)
                .filter(|s| s.user_id == ctx.user_id)
                .filter(|s| query.project_id.is_none_or(|p| s.project_id == Some(p)))
                .filter(|s| query.kind.as_deref().is_none_or(|k| s.kind == k))
                .collect();
            sessions.sort_by(|a, b| {
                b.created_at_ms.cmp(&a.created_at_ms).then(b.id.as_str().cmp(a.id.as_str()))
            });
            sessions.into_iter().skip(offset).take(limit).map(SessionView::from).collect()
        }))
    }

    pub fn update_session(
        &self,
        _ctx: &RequestCtx,
        session_id: &SessionId,
        request: SessionUpdateRequest,
    ) -> Result<SessionView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| ControlError::not_found(format!("Session not found: {session_id}")))?;

            let mut events = Vec::new();

            match &request.project_id {
                relay_core::Patch::Missing => {}
                relay_core::Patch::Null => {
                    events.push(Event::SessionProjectChanged { id: session.id, project_id: None });
                }
                relay_core::Patch::Value(project_id) => {
                    require_project(state, project_id, &session.user_id)?;
                    events.push(Event::SessionProjectChanged {
                        id: session.id,
                        project_id: Some(*project_id),
                    });
                }
            }

            if let Some(status) = &request.status {
                let status = parse_session_status(status)?;
                events.push(Event::SessionStatusChanged { id: session.id, status, at_ms: now });
            }
            if let Some(sdk_session_id) = &request.sdk_session_id {
                events.push(Event::SessionSdkLinked {
                    id: session.id,
                    sdk_session_id: sdk_session_id.clone(),
                });
            }
            if let Some(patch) = &request.state_patch {
                let state_patch = serde_json::from_value(patch.clone())
                    .map_err(|e| ControlError::bad_request(format!("Invalid state patch: {e}")))?;
                events.push(Event::SessionStateReplaced {
                    id: session.id,
                    state: state_patch,
                    at_ms: now,
                });
            }

            let export_status = request
                .workspace_export_status
                .as_deref()
                .map(parse_export_status)
                .transpose()?;
            if export_status.is_some()
                || request.workspace_files_prefix.is_some()
                || request.workspace_manifest_key.is_some()
                || request.workspace_archive_key.is_some()
            {
                events.push(Event::SessionExportUpdated {
                    id: session.id,
                    status: export_status,
                    files_prefix: request.workspace_files_prefix.clone(),
                    manifest_key: request.workspace_manifest_key.clone(),
                    archive_key: request.workspace_archive_key.clone(),
                });
            }

            // Build the post-update view by replaying onto a copy.
            let mut scratch = relay_storage::MaterializedState::default();
            scratch.sessions.insert(session.id, session.clone());
            for event in &events {
                scratch.apply_event(event);
            }
            let view = SessionView::from(&scratch.sessions[&session.id]);
            Ok((events, view))
        })
    }

    /// Soft delete. The record remains for audit; listings skip it.
    pub fn delete_session(
        &self,
        _ctx: &RequestCtx,
        session_id: &SessionId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| ControlError::not_found(format!("Session not found: {session_id}")))?;
            tracing::info!(session = %session.id, "session soft-deleted");
            Ok((vec![Event::SessionDeleted { id: session.id, at_ms: now }], ()))
        })
    }

    pub fn list_messages(
        &self,
        _ctx: &RequestCtx,
        session_id: &SessionId,
    ) -> Result<Vec<MessageView>, ControlError> {
        self.store.read(|state| {
            if !state.sessions.contains_key(session_id) {
                return Err(ControlError::not_found(format!("Session not found: {session_id}")));
            }
            Ok(state
                .messages
                .get(session_id)
                .map(|messages| messages.iter().map(MessageView::from).collect())
                .unwrap_or_default())
        })
    }

    pub fn list_tool_executions(
        &self,
        _ctx: &RequestCtx,
        session_id: &SessionId,
    ) -> Result<Vec<ToolExecutionView>, ControlError> {
        self.store.read(|state| {
            if !state.sessions.contains_key(session_id) {
                return Err(ControlError::not_found(format!("Session not found: {session_id}")));
            }
            Ok(state
                .tool_executions_for_session(session_id)
                .into_iter()
                .map(ToolExecutionView::from)
                .collect())
        })
    }

    pub fn list_usage(
        &self,
        _ctx: &RequestCtx,
        session_id: &SessionId,
    ) -> Result<Vec<UsageLogView>, ControlError> {
        self.store.read(|state| {
            if !state.sessions.contains_key(session_id) {
                return Err(ControlError::not_found(format!("Session not found: {session_id}")));
            }
            Ok(state
                .usage_logs
                .get(session_id)
                .map(|logs| logs.iter().map(UsageLogView::from).collect())
                .unwrap_or_default())
        })
    }

    /// Cancel a session: terminate every unfinished run, expire pending
    /// input requests, error out in-flight tool executions, and mark the
    /// session canceled, all in one commit.
    ///
    /// Telling the executor is the dispatcher's job and happens after
    /// this returns; local cancellation never depends on it.
    pub fn cancel_session(
        &self,
        ctx: &RequestCtx,
        session_id: &SessionId,
        request: CancelRequest,
    ) -> Result<CancelOutcome, ControlError> {
        let now = self.epoch_ms();
        let reason = request.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        self.store.transact(now, |state| {
            let session = state
                .sessions
                .get(session_id)
                .ok_or_else(|| ControlError::not_found(format!("Session not found: {session_id}")))?;
            if session.user_id != ctx.user_id {
                return Err(ControlError::forbidden("Session does not belong to the user"));
            }

            let mut events = Vec::new();
            let mut canceled_runs = 0usize;

            // Cancel all unfinished runs, including future scheduled ones.
            for run in state.runs_for_session(session_id) {
                if run.is_terminal() {
                    continue;
                }
                events.push(Event::RunFinished {
                    id: run.id,
                    status: relay_core::RunStatus::Canceled,
                    error: None,
                    at_ms: now,
                });
                if let Some(task_id) = run.scheduled_task_id {
                    events.push(Event::ScheduledTaskRunMirrored {
                        id: task_id,
                        run_id: run.id,
                        status: relay_core::RunStatus::Canceled,
                        error: None,
                    });
                }
                canceled_runs += 1;
            }

            // Expire pending input requests so the UI drops blocking cards.
            let pending = state.pending_inputs_for_session(session_id);
            let expired_input_requests = pending.len();
            for request in pending {
                events.push(Event::InputRequestExpired { id: request.id, at_ms: now });
            }

            // Mark in-flight tool executions as ended; their result blocks
            // may never arrive once the executor stops.
            let mut canceled_tool_executions = 0usize;
            for execution in state.tool_executions_for_session(session_id) {
                if execution.is_finished() {
                    continue;
                }
                events.push(Event::ToolCanceled {
                    session_id: *session_id,
                    tool_use_id: execution.tool_use_id.clone(),
                    reason: reason.map(String::from),
                    at_ms: now,
                });
                canceled_tool_executions += 1;
            }

            events.push(Event::SessionStatusChanged {
                id: *session_id,
                status: SessionStatus::Canceled,
                at_ms: now,
            });

            tracing::info!(
                session = %session_id,
                canceled_runs,
                expired_input_requests,
                canceled_tool_executions,
                "session canceled"
            );

            Ok((
                events,
                CancelOutcome {
                    session_id: *session_id,
                    status: SessionStatus::Canceled,
                    canceled_runs,
                    expired_input_requests,
                    canceled_tool_executions,
                    executor_notified: false,
                },
            ))
        })
    }
}

pub(crate) fn require_project(
    state: &relay_storage::MaterializedState,
    project_id: &ProjectId,
    user_id: &str,
) -> Result<relay_core::Project, ControlError> {
    match state.projects.get(project_id) {
        Some(project) if project.user_id == user_id => Ok(project.clone()),
        _ => Err(ControlError::not_found(format!("Project not found: {project_id}"))),
    }
}

fn parse_session_status(value: &str) -> Result<SessionStatus, ControlError> {
    match value {
        "pending" => Ok(SessionStatus::Pending),
        "running" => Ok(SessionStatus::Running),
        "completed" => Ok(SessionStatus::Completed),
        "failed" => Ok(SessionStatus::Failed),
        "canceled" => Ok(SessionStatus::Canceled),
        other => Err(ControlError::bad_request(format!("Invalid session status: {other}"))),
    }
}

fn parse_export_status(value: &str) -> Result<WorkspaceExportStatus, ControlError> {
    match value {
        "pending" => Ok(WorkspaceExportStatus::Pending),
        "ready" => Ok(WorkspaceExportStatus::Ready),
        "failed" => Ok(WorkspaceExportStatus::Failed),
        other => Err(ControlError::bad_request(format!("Invalid export status: {other}"))),
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
