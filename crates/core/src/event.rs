// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that drive state transitions in the system.
//!
//! Serializes with `{"type": "group:name", ...fields}` format. Creates
//! carry whole records so replay needs no external context; transitions
//! carry the changed fields plus an explicit timestamp.

use crate::callback::AgentStatePatch;
use crate::catalog::{
    EnvVar, EnvVarId, McpServer, McpServerId, Plugin, PluginId, Project, ProjectId, ScheduledTask,
    ScheduledTaskId, SkillId, SkillRecord, SlashCommand, SlashCommandId, SubAgent, SubAgentId,
    UserInstructions, UserMcpInstall, UserPluginInstall, UserSkillInstall,
};
use crate::config::ConfigSnapshot;
use crate::input_request::{UserInputRequest, UserInputRequestId};
use crate::message::{AgentMessage, MessageId};
use crate::run::{Run, RunId, RunStatus};
use crate::session::{Session, SessionId, SessionStatus, WorkspaceExportStatus};
use crate::usage::UsageLog;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events appended to the WAL and applied to the materialized state.
///
/// Unknown type tags deserialize to `Custom` so older daemons can skip
/// entries written by newer ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- session --
    #[serde(rename = "session:created")]
    SessionCreated { session: Session },

    #[serde(rename = "session:status")]
    SessionStatusChanged { id: SessionId, status: SessionStatus, at_ms: u64 },

    #[serde(rename = "session:config")]
    SessionConfigReplaced { id: SessionId, snapshot: ConfigSnapshot, at_ms: u64 },

    /// Clear stale execution chrome before a new run is queued.
    #[serde(rename = "session:state-cleared")]
    SessionStateCleared { id: SessionId, at_ms: u64 },

    #[serde(rename = "session:state")]
    SessionStateReplaced { id: SessionId, state: AgentStatePatch, at_ms: u64 },

    #[serde(rename = "session:sdk-linked")]
    SessionSdkLinked { id: SessionId, sdk_session_id: String },

    #[serde(rename = "session:project")]
    SessionProjectChanged { id: SessionId, project_id: Option<ProjectId> },

    #[serde(rename = "session:export")]
    SessionExportUpdated {
        id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<WorkspaceExportStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        files_prefix: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        manifest_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        archive_key: Option<String>,
    },

    /// Soft delete; the record stays for audit but drops out of listings.
    #[serde(rename = "session:deleted")]
    SessionDeleted { id: SessionId, at_ms: u64 },

    // -- run queue --
    #[serde(rename = "run:enqueued")]
    RunEnqueued { run: Run },

    #[serde(rename = "run:claimed")]
    RunClaimed {
        id: RunId,
        worker_id: String,
        lease_expires_at_ms: u64,
        /// Attempt count after this claim; carried explicitly so replay
        /// is deterministic.
        attempts: u32,
    },

    #[serde(rename = "run:started")]
    RunStarted { id: RunId, at_ms: u64 },

    #[serde(rename = "run:progress")]
    RunProgress { id: RunId, progress: u8 },

    #[serde(rename = "run:finished")]
    RunFinished {
        id: RunId,
        status: RunStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        at_ms: u64,
    },

    // -- transcript --
    #[serde(rename = "message:appended")]
    MessageAppended { message: AgentMessage },

    #[serde(rename = "tool:use")]
    ToolUseRecorded {
        id: crate::tool_execution::ToolExecutionId,
        session_id: SessionId,
        message_id: MessageId,
        tool_use_id: String,
        tool_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_input: Option<Value>,
        at_ms: u64,
    },

    #[serde(rename = "tool:result")]
    ToolResultRecorded {
        id: crate::tool_execution::ToolExecutionId,
        session_id: SessionId,
        result_message_id: MessageId,
        tool_use_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
        is_error: bool,
        at_ms: u64,
    },

    #[serde(rename = "tool:canceled")]
    ToolCanceled {
        session_id: SessionId,
        tool_use_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        at_ms: u64,
    },

    #[serde(rename = "usage:recorded")]
    UsageRecorded { usage: UsageLog },

    // -- user input requests --
    #[serde(rename = "input:created")]
    InputRequestCreated { request: UserInputRequest },

    #[serde(rename = "input:answered")]
    InputRequestAnswered { id: UserInputRequestId, answer: Value },

    #[serde(rename = "input:expired")]
    InputRequestExpired { id: UserInputRequestId, at_ms: u64 },

    // -- scheduled tasks --
    #[serde(rename = "schedtask:upserted")]
    ScheduledTaskUpserted { task: ScheduledTask },

    #[serde(rename = "schedtask:deleted")]
    ScheduledTaskDeleted { id: ScheduledTaskId },

    #[serde(rename = "schedtask:run-mirrored")]
    ScheduledTaskRunMirrored {
        id: ScheduledTaskId,
        run_id: RunId,
        status: RunStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    // -- capability catalogs --
    #[serde(rename = "envvar:upserted")]
    EnvVarUpserted { var: EnvVar },

    #[serde(rename = "envvar:deleted")]
    EnvVarDeleted { id: EnvVarId },

    #[serde(rename = "mcp:upserted")]
    McpServerUpserted { server: McpServer },

    #[serde(rename = "mcp:deleted")]
    McpServerDeleted { id: McpServerId },

    #[serde(rename = "mcp-install:upserted")]
    McpInstallUpserted { install: UserMcpInstall },

    #[serde(rename = "mcp-install:deleted")]
    McpInstallDeleted { user_id: String, server_id: McpServerId },

    #[serde(rename = "skill:upserted")]
    SkillUpserted { skill: SkillRecord },

    #[serde(rename = "skill:deleted")]
    SkillDeleted { id: SkillId },

    #[serde(rename = "skill-install:upserted")]
    SkillInstallUpserted { install: UserSkillInstall },

    #[serde(rename = "skill-install:deleted")]
    SkillInstallDeleted { user_id: String, skill_id: SkillId },

    #[serde(rename = "plugin:upserted")]
    PluginUpserted { plugin: Plugin },

    #[serde(rename = "plugin:deleted")]
    PluginDeleted { id: PluginId },

    #[serde(rename = "plugin-install:upserted")]
    PluginInstallUpserted { install: UserPluginInstall },

    #[serde(rename = "plugin-install:deleted")]
    PluginInstallDeleted { user_id: String, plugin_id: PluginId },

    #[serde(rename = "subagent:upserted")]
    SubAgentUpserted { agent: SubAgent },

    #[serde(rename = "subagent:deleted")]
    SubAgentDeleted { id: SubAgentId },

    #[serde(rename = "command:upserted")]
    SlashCommandUpserted { command: SlashCommand },

    #[serde(rename = "command:deleted")]
    SlashCommandDeleted { id: SlashCommandId },

    #[serde(rename = "project:upserted")]
    ProjectUpserted { project: Project },

    #[serde(rename = "project:deleted")]
    ProjectDeleted { id: ProjectId },

    #[serde(rename = "instructions:set")]
    InstructionsSet { record: UserInstructions },

    /// Unknown event type (forward compatibility).
    #[serde(other)]
    Custom,
}

impl Event {
    /// Short human-readable summary for logs.
    pub fn summary(&self) -> String {
        match self {
            Event::SessionCreated { session } => format!("session:created {}", session.id),
            Event::SessionStatusChanged { id, status, .. } => {
                format!("session:status {id} -> {status}")
            }
            Event::SessionConfigReplaced { id, .. } => format!("session:config {id}"),
            Event::SessionStateCleared { id, .. } => format!("session:state-cleared {id}"),
            Event::SessionStateReplaced { id, .. } => format!("session:state {id}"),
            Event::SessionSdkLinked { id, sdk_session_id } => {
                format!("session:sdk-linked {id} -> {sdk_session_id}")
            }
            Event::SessionProjectChanged { id, .. } => format!("session:project {id}"),
            Event::SessionExportUpdated { id, status, .. } => match status {
                Some(s) => format!("session:export {id} {s}"),
                None => format!("session:export {id}"),
            },
            Event::SessionDeleted { id, .. } => format!("session:deleted {id}"),
            Event::RunEnqueued { run } => {
                format!("run:enqueued {} mode={}", run.id, run.schedule_mode)
            }
            Event::RunClaimed { id, worker_id, .. } => format!("run:claimed {id} by={worker_id}"),
            Event::RunStarted { id, .. } => format!("run:started {id}"),
            Event::RunProgress { id, progress } => format!("run:progress {id} {progress}%"),
            Event::RunFinished { id, status, .. } => format!("run:finished {id} -> {status}"),
            Event::MessageAppended { message } => {
                format!("message:appended {} role={}", message.id, message.role)
            }
            Event::ToolUseRecorded { tool_use_id, tool_name, .. } => {
                format!("tool:use {tool_use_id} {tool_name}")
            }
            Event::ToolResultRecorded { tool_use_id, is_error, .. } => {
                format!("tool:result {tool_use_id} err={is_error}")
            }
            Event::ToolCanceled { tool_use_id, .. } => format!("tool:canceled {tool_use_id}"),
            Event::UsageRecorded { usage } => format!("usage:recorded {}", usage.session_id),
            Event::InputRequestCreated { request } => format!("input:created {}", request.id),
            Event::InputRequestAnswered { id, .. } => format!("input:answered {id}"),
            Event::InputRequestExpired { id, .. } => format!("input:expired {id}"),
            Event::ScheduledTaskUpserted { task } => format!("schedtask:upserted {}", task.id),
            Event::ScheduledTaskDeleted { id } => format!("schedtask:deleted {id}"),
            Event::ScheduledTaskRunMirrored { id, run_id, status, .. } => {
                format!("schedtask:run-mirrored {id} {run_id} -> {status}")
            }
            Event::EnvVarUpserted { var } => format!("envvar:upserted {}", var.key),
            Event::EnvVarDeleted { id } => format!("envvar:deleted {id}"),
            Event::McpServerUpserted { server } => format!("mcp:upserted {}", server.name),
            Event::McpServerDeleted { id } => format!("mcp:deleted {id}"),
            Event::McpInstallUpserted { install } => {
                format!("mcp-install:upserted {}/{}", install.user_id, install.server_id)
            }
            Event::McpInstallDeleted { user_id, server_id } => {
                format!("mcp-install:deleted {user_id}/{server_id}")
            }
            Event::SkillUpserted { skill } => format!("skill:upserted {}", skill.name),
            Event::SkillDeleted { id } => format!("skill:deleted {id}"),
            Event::SkillInstallUpserted { install } => {
                format!("skill-install:upserted {}/{}", install.user_id, install.skill_id)
            }
            Event::SkillInstallDeleted { user_id, skill_id } => {
                format!("skill-install:deleted {user_id}/{skill_id}")
            }
            Event::PluginUpserted { plugin } => format!("plugin:upserted {}", plugin.name),
            Event::PluginDeleted { id } => format!("plugin:deleted {id}"),
            Event::PluginInstallUpserted { install } => {
                format!("plugin-install:upserted {}/{}", install.user_id, install.plugin_id)
            }
            Event::PluginInstallDeleted { user_id, plugin_id } => {
                format!("plugin-install:deleted {user_id}/{plugin_id}")
            }
            Event::SubAgentUpserted { agent } => format!("subagent:upserted {}", agent.name),
            Event::SubAgentDeleted { id } => format!("subagent:deleted {id}"),
            Event::SlashCommandUpserted { command } => {
                format!("command:upserted {}", command.name)
            }
            Event::SlashCommandDeleted { id } => format!("command:deleted {id}"),
            Event::ProjectUpserted { project } => format!("project:upserted {}", project.name),
            Event::ProjectDeleted { id } => format!("project:deleted {id}"),
            Event::InstructionsSet { record } => format!("instructions:set {}", record.user_id),
            Event::Custom => "custom".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
