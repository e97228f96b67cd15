// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived from WAL replay.

mod catalogs;
mod runs;
mod sessions;
mod transcript;

use relay_core::{
    AgentMessage, EnvVar, EnvVarId, Event, McpServer, McpServerId, Plugin, PluginId, Project,
    ProjectId, Run, RunId, ScheduledTask, ScheduledTaskId, Session, SessionId, SkillId,
    SkillRecord, SlashCommand, SlashCommandId, SubAgent, SubAgentId, ToolExecution,
    UsageLog, UserInputRequest, UserInputRequestId, UserInstructions, UserMcpInstall,
    UserPluginInstall, UserSkillInstall,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Composite key for install links: `user_id/capability_id`.
pub fn install_key(user_id: &str, capability_id: &str) -> String {
    format!("{user_id}/{capability_id}")
}

/// Materialized state built from WAL events.
///
/// # Reducer discipline
///
/// Every event handler must be deterministic from `(state, event)` alone:
/// no clocks, no randomness. Events carry their own timestamps and ids so
/// replay reproduces state byte for byte.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub sessions: HashMap<SessionId, Session>,
    pub runs: HashMap<RunId, Run>,
    /// Transcript per session, in commit order.
    #[serde(default)]
    pub messages: HashMap<SessionId, Vec<AgentMessage>>,
    /// Keyed by `session_id/tool_use_id` (see [`relay_core::tool_key`]).
    #[serde(default)]
    pub tool_executions: HashMap<String, ToolExecution>,
    #[serde(default)]
    pub usage_logs: HashMap<SessionId, Vec<UsageLog>>,
    #[serde(default)]
    pub input_requests: HashMap<UserInputRequestId, UserInputRequest>,
    #[serde(default)]
    pub env_vars: HashMap<EnvVarId, EnvVar>,
    #[serde(default)]
    pub mcp_servers: HashMap<McpServerId, McpServer>,
    /// Keyed by [`install_key`].
    #[serde(default)]
    pub mcp_installs: HashMap<String, UserMcpInstall>,
    #[serde(default)]
    pub skills: HashMap<SkillId, SkillRecord>,
    #[serde(default)]
    pub skill_installs: HashMap<String, UserSkillInstall>,
    #[serde(default)]
    pub plugins: HashMap<PluginId, Plugin>,
    #[serde(default)]
    pub plugin_installs: HashMap<String, UserPluginInstall>,
    #[serde(default)]
    pub subagents: HashMap<SubAgentId, SubAgent>,
    #[serde(default)]
    pub slash_commands: HashMap<SlashCommandId, SlashCommand>,
    #[serde(default)]
    pub projects: HashMap<ProjectId, Project>,
    #[serde(default)]
    pub scheduled_tasks: HashMap<ScheduledTaskId, ScheduledTask>,
    /// Per-user persistent instructions.
    #[serde(default)]
    pub instructions: HashMap<String, UserInstructions>,
}

impl MaterializedState {
    /// Resolve a session by internal id or by the executor's SDK id.
    pub fn session_by_id_or_sdk(&self, id: &str) -> Option<&Session> {
        if let Some(session) = self.sessions.get(id) {
            return Some(session);
        }
        self.sessions.values().find(|s| s.sdk_session_id.as_deref() == Some(id))
    }

    /// Runs for a session, newest first.
    pub fn runs_for_session(&self, session_id: &SessionId) -> Vec<&Run> {
        let mut runs: Vec<&Run> =
            self.runs.values().filter(|r| r.session_id == *session_id).collect();
        runs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(b.id.as_str().cmp(a.id.as_str())));
        runs
    }

    /// The newest non-terminal run for a session, the one callbacks bind to.
    pub fn latest_nonterminal_run(&self, session_id: &SessionId) -> Option<&Run> {
        self.runs_for_session(session_id).into_iter().find(|r| !r.is_terminal())
    }

    /// Tool executions for a session, oldest first.
    pub fn tool_executions_for_session(&self, session_id: &SessionId) -> Vec<&ToolExecution> {
        let mut items: Vec<&ToolExecution> = self
            .tool_executions
            .values()
            .filter(|t| t.session_id == *session_id)
            .collect();
        items.sort_by(|a, b| {
            a.created_at_ms.cmp(&b.created_at_ms).then(a.tool_use_id.cmp(&b.tool_use_id))
        });
        items
    }

    /// Pending input requests for a session.
    pub fn pending_inputs_for_session(&self, session_id: &SessionId) -> Vec<&UserInputRequest> {
        self.input_requests
            .values()
            .filter(|r| {
                r.session_id == *session_id
                    && r.status == relay_core::InputRequestStatus::Pending
            })
            .collect()
    }

    /// Apply an event to derive state changes.
    ///
    /// Events are facts about what happened; state is derived from those
    /// facts. Handlers must stay deterministic (see type-level docs).
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::SessionCreated { .. }
            | Event::SessionStatusChanged { .. }
            | Event::SessionConfigReplaced { .. }
            | Event::SessionStateCleared { .. }
            | Event::SessionStateReplaced { .. }
            | Event::SessionSdkLinked { .. }
            | Event::SessionProjectChanged { .. }
            | Event::SessionExportUpdated { .. }
            | Event::SessionDeleted { .. } => sessions::apply(self, event),

            Event::RunEnqueued { .. }
            | Event::RunClaimed { .. }
            | Event::RunStarted { .. }
            | Event::RunProgress { .. }
            | Event::RunFinished { .. } => runs::apply(self, event),

            Event::MessageAppended { .. }
            | Event::ToolUseRecorded { .. }
            | Event::ToolResultRecorded { .. }
            | Event::ToolCanceled { .. }
            | Event::UsageRecorded { .. }
            | Event::InputRequestCreated { .. }
            | Event::InputRequestAnswered { .. }
            | Event::InputRequestExpired { .. } => transcript::apply(self, event),

            Event::ScheduledTaskUpserted { .. }
            | Event::ScheduledTaskDeleted { .. }
            | Event::ScheduledTaskRunMirrored { .. }
            | Event::EnvVarUpserted { .. }
            | Event::EnvVarDeleted { .. }
            | Event::McpServerUpserted { .. }
            | Event::McpServerDeleted { .. }
            | Event::McpInstallUpserted { .. }
            | Event::McpInstallDeleted { .. }
            | Event::SkillUpserted { .. }
            | Event::SkillDeleted { .. }
            | Event::SkillInstallUpserted { .. }
            | Event::SkillInstallDeleted { .. }
            | Event::PluginUpserted { .. }
            | Event::PluginDeleted { .. }
            | Event::PluginInstallUpserted { .. }
            | Event::PluginInstallDeleted { .. }
            | Event::SubAgentUpserted { .. }
            | Event::SubAgentDeleted { .. }
            | Event::SlashCommandUpserted { .. }
            | Event::SlashCommandDeleted { .. }
            | Event::ProjectUpserted { .. }
            | Event::ProjectDeleted { .. }
            | Event::InstructionsSet { .. } => catalogs::apply(self, event),

            // Unknown events from newer writers are skipped.
            Event::Custom => {}
        }
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
