// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task enqueue: session resolution, config snapshot merge, schedule
//! validation, and run creation in one commit.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::sessions::require_project;
use crate::Control;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use relay_core::config::keys;
use relay_core::{
    merge_config_map, AgentMessage, Clock, ConfigSnapshot, Event, PermissionMode, Project, Run,
    RunConfig, ScheduleMode, Session, SessionConfig, SessionStatus, TaskConfig,
};
use relay_storage::MaterializedState;
use relay_wire::{TaskEnqueueOutcome, TaskEnqueueRequest};
use serde_json::Value;

impl<C: Clock> Control<C> {
    /// Enqueue a run for a session (creating the session if needed).
    pub fn enqueue_task(
        &self,
        ctx: &RequestCtx,
        request: TaskEnqueueRequest,
    ) -> Result<TaskEnqueueOutcome, ControlError> {
        let now = self.epoch_ms();

        let prompt = request.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(ControlError::bad_request("Prompt cannot be empty"));
        }

        let permission_mode = PermissionMode::parse(request.permission_mode.as_deref().unwrap_or(""))
            .ok_or_else(|| {
                ControlError::bad_request(format!(
                    "Invalid permission_mode: {}",
                    request.permission_mode.as_deref().unwrap_or("")
                ))
            })?;

        let (schedule_mode, scheduled_at_ms) = resolve_schedule(
            request.schedule_mode.as_deref(),
            request.scheduled_at.as_deref(),
            request.timezone.as_deref(),
        )?;

        self.store.transact(now, |state| {
            let project = match request.project_id {
                Some(project_id) => Some(require_project(state, &project_id, &ctx.user_id)?),
                None => None,
            };

            let mut events = Vec::new();

            let (session_id, base_config) = match request.session_id {
                Some(session_id) => {
                    let session = state.sessions.get(&session_id).ok_or_else(|| {
                        ControlError::not_found(format!("Session not found: {session_id}"))
                    })?;
                    if session.user_id != ctx.user_id {
                        return Err(ControlError::forbidden(
                            "Session does not belong to the user",
                        ));
                    }
                    if let Some(project_id) = request.project_id {
                        if session.project_id != Some(project_id) {
                            return Err(ControlError::bad_request(
                                "project_id does not match the session",
                            ));
                        }
                    }
                    // Clear previous execution state so the UI doesn't show
                    // stale file changes while the new run is queued.
                    events.push(Event::SessionStateCleared { id: session_id, at_ms: now });
                    (session_id, session.config_snapshot.clone())
                }
                None => (relay_core::SessionId::new(), ConfigSnapshot::default()),
            };

            let mut merged = build_config_snapshot(
                state,
                &ctx.user_id,
                request.config.as_ref(),
                &base_config,
            );
            apply_project_repo_defaults(&mut merged, project.as_ref());

            if request.session_id.is_some() {
                events.push(Event::SessionConfigReplaced {
                    id: session_id,
                    snapshot: merged.clone(),
                    at_ms: now,
                });
            } else {
                let mut config = SessionConfig::new(ctx.user_id.clone())
                    .id(session_id)
                    .config_snapshot(merged.clone());
                config.project_id = request.project_id;
                let session = Session::new_with_epoch_ms(config, now);
                events.push(Event::SessionCreated { session });
            }

            let message = AgentMessage::user_prompt(session_id, &prompt, now);
            let user_message_id = message.id;
            events.push(Event::MessageAppended { message });

            // input_files are per-run inputs: only the run snapshot
            // carries them, never the session-level config.
            let mut run_snapshot = merged.clone();
            if let Some(files) = request.config.as_ref().and_then(TaskConfig::input_files) {
                if !files.is_empty() {
                    run_snapshot.insert(keys::INPUT_FILES, Value::Array(files.clone()));
                }
            }

            let mut run_config = RunConfig::new(session_id, user_message_id)
                .schedule_mode(schedule_mode)
                .permission_mode(permission_mode)
                .config_snapshot(run_snapshot);
            run_config.scheduled_at_ms = scheduled_at_ms;
            let run = Run::new_with_epoch_ms(run_config, now);
            let run_id = run.id;
            events.push(Event::RunEnqueued { run });

            events.push(Event::SessionStatusChanged {
                id: session_id,
                status: SessionStatus::Pending,
                at_ms: now,
            });

            tracing::info!(
                session = %session_id,
                run = %run_id,
                mode = %schedule_mode,
                user = %ctx.user_id,
                "run enqueued"
            );

            Ok((
                events,
                TaskEnqueueOutcome {
                    session_id,
                    run_id,
                    status: relay_core::RunStatus::Queued,
                },
            ))
        })
    }
}

/// Resolve `(schedule_mode, scheduled_at)` from the request, normalizing
/// to UTC epoch milliseconds.
fn resolve_schedule(
    mode: Option<&str>,
    scheduled_at: Option<&str>,
    timezone: Option<&str>,
) -> Result<(ScheduleMode, Option<u64>), ControlError> {
    let mode = mode.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("immediate");
    let scheduled_at_ms = scheduled_at
        .map(|raw| normalize_scheduled_at(raw, timezone))
        .transpose()?;

    match mode {
        "scheduled" => match scheduled_at_ms {
            Some(at) => Ok((ScheduleMode::Scheduled, Some(at))),
            None => Err(ControlError::bad_request(
                "scheduled_at is required when schedule_mode=scheduled",
            )),
        },
        "immediate" => match scheduled_at_ms {
            // Callers providing only a timestamp mean "scheduled".
            Some(at) => Ok((ScheduleMode::Scheduled, Some(at))),
            None => Ok((ScheduleMode::Immediate, None)),
        },
        "nightly" => match scheduled_at_ms {
            Some(_) => Err(ControlError::bad_request(
                "scheduled_at cannot be provided when schedule_mode=nightly",
            )),
            None => Ok((ScheduleMode::Nightly, None)),
        },
        other => Err(ControlError::bad_request(format!("Invalid schedule_mode: {other}"))),
    }
}

/// Parse an RFC 3339 timestamp, or a naive one interpreted in the given
/// IANA timezone (UTC when absent), to UTC epoch milliseconds.
fn normalize_scheduled_at(raw: &str, timezone: Option<&str>) -> Result<u64, ControlError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc).timestamp_millis().max(0) as u64);
    }

    let naive = parse_naive(raw)
        .ok_or_else(|| ControlError::bad_request(format!("Invalid scheduled_at: {raw}")))?;

    let tz_name = timezone.map(str::trim).filter(|t| !t.is_empty());
    let resolved: DateTime<Utc> = match tz_name {
        Some(name) => {
            let tz: chrono_tz::Tz = name
                .parse()
                .map_err(|_| ControlError::bad_request(format!("Invalid timezone: {name}")))?;
            tz.from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| {
                    ControlError::bad_request(format!("Unrepresentable scheduled_at: {raw}"))
                })?
                .with_timezone(&Utc)
        }
        None => Utc.from_utc_datetime(&naive),
    };
    Ok(resolved.timestamp_millis().max(0) as u64)
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    None
}

/// Build the merged config snapshot for a session (see SPEC notes on the
/// merge): strip sensitive/per-run keys from the base, overlay explicit
/// fields, then materialize the effective id lists.
pub(crate) fn build_config_snapshot(
    state: &MaterializedState,
    user_id: &str,
    task_config: Option<&TaskConfig>,
    base_config: &ConfigSnapshot,
) -> ConfigSnapshot {
    let mut base = base_config.0.clone();
    // Never persist full MCP server configs inside snapshots; they may
    // contain sensitive values and are resolved from ids at dispatch.
    base.remove(keys::MCP_CONFIG);
    // Legacy field (replaced by skill_ids).
    base.remove(keys::SKILL_FILES);
    // input_files are per-run inputs.
    base.remove(keys::INPUT_FILES);

    let base_mcp_ids =
        base.get(keys::MCP_SERVER_IDS).and_then(relay_core::normalize_id_list);
    let base_skill_ids = base.get(keys::SKILL_IDS).and_then(relay_core::normalize_id_list);

    let mut merged = match task_config {
        Some(config) => merge_config_map(&base, config.overrides()),
        None => base,
    };

    let mcp_toggles = task_config.and_then(TaskConfig::mcp_toggles);
    let skill_toggles = task_config.and_then(TaskConfig::skill_toggles);

    let mcp_server_ids = match (mcp_toggles, base_mcp_ids) {
        (Some(toggles), _) => mcp_ids_with_toggles(state, user_id, toggles),
        (None, Some(base_ids)) => base_ids,
        (None, None) => default_mcp_ids(state, user_id),
    };
    merged.insert(keys::MCP_SERVER_IDS.to_string(), to_id_array(&mcp_server_ids));

    let skill_ids = match (skill_toggles, base_skill_ids) {
        (Some(toggles), _) => skill_ids_with_toggles(state, user_id, toggles),
        (None, Some(base_ids)) => base_ids,
        (None, None) => default_skill_ids(state, user_id),
    };
    merged.insert(keys::SKILL_IDS.to_string(), to_id_array(&skill_ids));

    let subagent_ids = merged
        .get(keys::SUBAGENT_IDS)
        .and_then(relay_core::normalize_id_list)
        .unwrap_or_else(|| default_subagent_ids(state, user_id));
    merged.insert(keys::SUBAGENT_IDS.to_string(), to_id_array(&subagent_ids));

    ConfigSnapshot(merged)
}

fn to_id_array(ids: &[String]) -> Value {
    Value::Array(ids.iter().map(|id| Value::String(id.clone())).collect())
}

fn default_mcp_ids(state: &MaterializedState, user_id: &str) -> Vec<String> {
    let mut installs: Vec<_> = state
        .mcp_installs
        .values()
        .filter(|i| i.user_id == user_id && i.enabled)
        .collect();
    installs.sort_by_key(|i| (i.created_at_ms, i.server_id));
    installs.into_iter().map(|i| i.server_id.as_str().to_string()).collect()
}

fn mcp_ids_with_toggles(
    state: &MaterializedState,
    user_id: &str,
    toggles: &std::collections::BTreeMap<String, bool>,
) -> Vec<String> {
    let mut installs: Vec<_> =
        state.mcp_installs.values().filter(|i| i.user_id == user_id).collect();
    installs.sort_by_key(|i| (i.created_at_ms, i.server_id));

    let mut result = Vec::new();
    for install in installs {
        let id = install.server_id.as_str();
        match toggles.get(id) {
            Some(true) => result.push(id.to_string()),
            Some(false) => {}
            None if install.enabled => result.push(id.to_string()),
            None => {}
        }
    }
    result
}

fn default_skill_ids(state: &MaterializedState, user_id: &str) -> Vec<String> {
    let mut installs: Vec<_> = state
        .skill_installs
        .values()
        .filter(|i| i.user_id == user_id && i.enabled)
        .collect();
    installs.sort_by_key(|i| (i.created_at_ms, i.skill_id));
    installs.into_iter().map(|i| i.skill_id.as_str().to_string()).collect()
}

fn skill_ids_with_toggles(
    state: &MaterializedState,
    user_id: &str,
    toggles: &std::collections::BTreeMap<String, bool>,
) -> Vec<String> {
    let mut installs: Vec<_> =
        state.skill_installs.values().filter(|i| i.user_id == user_id).collect();
    installs.sort_by_key(|i| (i.created_at_ms, i.skill_id));

    let mut result = Vec::new();
    for install in installs {
        let id = install.skill_id.as_str();
        match toggles.get(id) {
            Some(true) => result.push(id.to_string()),
            Some(false) => {}
            None if install.enabled => result.push(id.to_string()),
            None => {}
        }
    }
    result
}

fn default_subagent_ids(state: &MaterializedState, user_id: &str) -> Vec<String> {
    let mut agents: Vec<_> = state
        .subagents
        .values()
        .filter(|a| a.user_id == user_id && a.enabled)
        .collect();
    agents.sort_by_key(|a| (a.created_at_ms, a.id));
    agents.into_iter().map(|a| a.id.as_str().to_string()).collect()
}

/// Fill repo context from project defaults when the caller did not
/// explicitly provide one. An explicitly-set `repo_url` is never
/// overridden; matching the project's repo backfills only the missing
/// companion fields.
pub(crate) fn apply_project_repo_defaults(
    snapshot: &mut ConfigSnapshot,
    project: Option<&Project>,
) {
    let Some(project) = project else { return };
    let Some(project_repo) = project.repo_url() else { return };

    let repo_key_present = snapshot.get(keys::REPO_URL).is_some();
    let repo_value = snapshot.str_field(keys::REPO_URL).map(String::from);

    let fill_companions = |snapshot: &mut ConfigSnapshot| {
        if snapshot.get(keys::GIT_BRANCH).is_none() {
            if let Some(branch) = project.git_branch() {
                snapshot.insert(keys::GIT_BRANCH, Value::String(branch.to_string()));
            }
        }
        if snapshot.get(keys::GIT_TOKEN_ENV_KEY).is_none() {
            if let Some(token_key) = project.git_token_env_key() {
                snapshot.insert(keys::GIT_TOKEN_ENV_KEY, Value::String(token_key.to_string()));
            }
        }
    };

    if !repo_key_present {
        snapshot.insert(keys::REPO_URL, Value::String(project_repo.to_string()));
        fill_companions(snapshot);
        return;
    }

    // Explicitly set (including explicit empty): do not override. Same
    // repo as the project: safe to backfill branch/token defaults.
    if repo_value.as_deref() == Some(project_repo) {
        fill_companions(snapshot);
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
