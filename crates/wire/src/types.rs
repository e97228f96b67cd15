// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response payload shapes (views over core records).
//!
//! Views sanitize as they convert: snapshots lose raw MCP configs and
//! env-var views never carry values outside the internal surface.

use relay_core::{
    AgentStatePatch, CallbackStatus, ConfigSnapshot, EnvVar, EnvVarId, InputRequestStatus,
    McpServer, McpServerId, MessageId, MessageRole, PermissionMode, Plugin, PluginId, Project,
    ProjectId, Run, RunId, RunStatus, ScheduleMode, ScheduledTask, ScheduledTaskId, Scope,
    SessionId, SessionStatus, SkillId, SkillRecord, SlashCommand, SlashCommandId,
    SlashCommandMode, SubAgent, SubAgentId, SubAgentMode, ToolExecution, ToolExecutionId,
    UsageLog, UsageLogId, UserInputRequest, UserInputRequestId, UserInstructions,
    WorkspaceExportStatus,
};
use relay_core::Session;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    pub kind: String,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_session_id: Option<String>,
    #[serde(default)]
    pub config_snapshot: ConfigSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_patch: Option<AgentStatePatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_export_status: Option<WorkspaceExportStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_files_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_manifest_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_archive_key: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            user_id: session.user_id.clone(),
            project_id: session.project_id,
            kind: session.kind.clone(),
            status: session.status,
            sdk_session_id: session.sdk_session_id.clone(),
            config_snapshot: session.config_snapshot.sanitized(),
            state_patch: session.state_patch.clone(),
            workspace_export_status: session.workspace_export_status,
            workspace_files_prefix: session.workspace_files_prefix.clone(),
            workspace_manifest_key: session.workspace_manifest_key.clone(),
            workspace_archive_key: session.workspace_archive_key.clone(),
            created_at_ms: session.created_at_ms,
            updated_at_ms: session.updated_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStateView {
    pub session_id: SessionId,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_patch: Option<AgentStatePatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_export_status: Option<WorkspaceExportStatus>,
    pub updated_at_ms: u64,
}

impl From<&Session> for SessionStateView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            status: session.status,
            state_patch: session.state_patch.clone(),
            workspace_export_status: session.workspace_export_status,
            updated_at_ms: session.updated_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunView {
    pub run_id: RunId,
    pub session_id: SessionId,
    pub user_message_id: MessageId,
    pub status: RunStatus,
    pub progress: u8,
    pub schedule_mode: ScheduleMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at_ms: Option<u64>,
    #[serde(default)]
    pub config_snapshot: ConfigSnapshot,
    pub permission_mode: PermissionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_expires_at_ms: Option<u64>,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_task_id: Option<ScheduledTaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    pub created_at_ms: u64,
}

impl From<&Run> for RunView {
    fn from(run: &Run) -> Self {
        Self {
            run_id: run.id,
            session_id: run.session_id,
            user_message_id: run.user_message_id,
            status: run.status,
            progress: run.progress,
            schedule_mode: run.schedule_mode,
            scheduled_at_ms: run.scheduled_at_ms,
            config_snapshot: run.config_snapshot.sanitized(),
            permission_mode: run.permission_mode,
            claimed_by: run.claimed_by.clone(),
            lease_expires_at_ms: run.lease_expires_at_ms,
            attempts: run.attempts,
            last_error: run.last_error.clone(),
            scheduled_task_id: run.scheduled_task_id,
            started_at_ms: run.started_at_ms,
            finished_at_ms: run.finished_at_ms,
            created_at_ms: run.created_at_ms,
        }
    }
}

/// What a worker receives from a successful claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunClaimGrant {
    pub run: RunView,
    pub user_id: String,
    /// The user message text for this run.
    pub prompt: String,
    /// Run snapshot with MCP configs stripped; full configs are resolved
    /// later by the dispatcher from ids.
    #[serde(default)]
    pub config_snapshot: ConfigSnapshot,
    /// Absent when the run must start a fresh agent session (scheduled
    /// tasks never resume).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnqueueOutcome {
    pub session_id: SessionId,
    pub run_id: RunId,
    pub status: RunStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOutcome {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub canceled_runs: usize,
    pub expired_input_requests: usize,
    pub canceled_tool_executions: usize,
    /// Whether the dispatcher acknowledged the executor cancel. Local
    /// cancellation succeeds regardless.
    pub executor_notified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackAck {
    pub status: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_status: Option<CallbackStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl CallbackAck {
    pub fn received(session_id: impl Into<String>) -> Self {
        Self {
            status: "received".to_string(),
            session_id: session_id.into(),
            callback_status: None,
            progress: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionView {
    pub id: ToolExecutionId,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    pub tool_use_id: String,
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message_id: Option<MessageId>,
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub created_at_ms: u64,
}

impl From<&ToolExecution> for ToolExecutionView {
    fn from(execution: &ToolExecution) -> Self {
        Self {
            id: execution.id,
            session_id: execution.session_id,
            message_id: execution.message_id,
            tool_use_id: execution.tool_use_id.clone(),
            tool_name: execution.tool_name.clone(),
            tool_input: execution.tool_input.clone(),
            tool_output: execution.tool_output.clone(),
            result_message_id: execution.result_message_id,
            is_error: execution.is_error,
            duration_ms: execution.duration_ms,
            created_at_ms: execution.created_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_preview: Option<String>,
    pub created_at_ms: u64,
}

impl From<&relay_core::AgentMessage> for MessageView {
    fn from(message: &relay_core::AgentMessage) -> Self {
        Self {
            id: message.id,
            session_id: message.session_id,
            role: message.role,
            content: message.content.clone(),
            text_preview: message.text_preview.clone(),
            created_at_ms: message.created_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLogView {
    pub id: UsageLogId,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    pub total_cost_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub usage: Value,
    pub created_at_ms: u64,
}

impl From<&UsageLog> for UsageLogView {
    fn from(log: &UsageLog) -> Self {
        Self {
            id: log.id,
            session_id: log.session_id,
            run_id: log.run_id,
            total_cost_usd: log.total_cost_usd,
            duration_ms: log.duration_ms,
            usage: log.usage.clone(),
            created_at_ms: log.created_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRequestView {
    pub id: UserInputRequestId,
    pub session_id: SessionId,
    pub status: InputRequestStatus,
    pub expires_at_ms: u64,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    pub created_at_ms: u64,
}

impl From<&UserInputRequest> for InputRequestView {
    fn from(request: &UserInputRequest) -> Self {
        Self {
            id: request.id,
            session_id: request.session_id,
            status: request.status,
            expires_at_ms: request.expires_at_ms,
            payload: request.payload.clone(),
            answer: request.answer.clone(),
            created_at_ms: request.created_at_ms,
        }
    }
}

/// Public env-var listing entry: never carries the value, only whether
/// one is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVarPublicView {
    pub id: EnvVarId,
    pub user_id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scope: Scope,
    pub is_set: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&EnvVar> for EnvVarPublicView {
    fn from(var: &EnvVar) -> Self {
        Self {
            id: var.id,
            user_id: var.user_id.clone(),
            key: var.key.clone(),
            description: var.description.clone(),
            scope: var.scope,
            is_set: var.is_set(),
            created_at_ms: var.created_at_ms,
            updated_at_ms: var.updated_at_ms,
        }
    }
}

/// Internal system env-var view; the only surface that carries values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEnvVarView {
    pub id: EnvVarId,
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&EnvVar> for SystemEnvVarView {
    fn from(var: &EnvVar) -> Self {
        Self {
            id: var.id,
            key: var.key.clone(),
            value: var.value.clone(),
            description: var.description.clone(),
            created_at_ms: var.created_at_ms,
            updated_at_ms: var.updated_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerView {
    pub id: McpServerId,
    pub name: String,
    pub scope: Scope,
    pub owner_user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&McpServer> for McpServerView {
    fn from(server: &McpServer) -> Self {
        Self {
            id: server.id,
            name: server.name.clone(),
            scope: server.scope,
            owner_user_id: server.owner_user_id.clone(),
            description: server.description.clone(),
            created_at_ms: server.created_at_ms,
            updated_at_ms: server.updated_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillView {
    pub id: SkillId,
    pub name: String,
    pub scope: Scope,
    pub owner_user_id: String,
    #[serde(default)]
    pub entry: Value,
    #[serde(default)]
    pub source: Value,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&SkillRecord> for SkillView {
    fn from(skill: &SkillRecord) -> Self {
        Self {
            id: skill.id,
            name: skill.name.clone(),
            scope: skill.scope,
            owner_user_id: skill.owner_user_id.clone(),
            entry: skill.entry.clone(),
            source: skill.source.clone(),
            created_at_ms: skill.created_at_ms,
            updated_at_ms: skill.updated_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginView {
    pub id: PluginId,
    pub name: String,
    pub scope: Scope,
    pub owner_user_id: String,
    #[serde(default)]
    pub manifest: Value,
    #[serde(default)]
    pub source: Value,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&Plugin> for PluginView {
    fn from(plugin: &Plugin) -> Self {
        Self {
            id: plugin.id,
            name: plugin.name.clone(),
            scope: plugin.scope,
            owner_user_id: plugin.owner_user_id.clone(),
            manifest: plugin.manifest.clone(),
            source: plugin.source.clone(),
            created_at_ms: plugin.created_at_ms,
            updated_at_ms: plugin.updated_at_ms,
        }
    }
}

/// Install link view, generic over the capability id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallView {
    pub user_id: String,
    pub capability_id: String,
    pub enabled: bool,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAgentView {
    pub id: SubAgentId,
    pub user_id: String,
    pub name: String,
    pub enabled: bool,
    pub mode: SubAgentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_markdown: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&SubAgent> for SubAgentView {
    fn from(agent: &SubAgent) -> Self {
        Self {
            id: agent.id,
            user_id: agent.user_id.clone(),
            name: agent.name.clone(),
            enabled: agent.enabled,
            mode: agent.mode,
            description: agent.description.clone(),
            prompt: agent.prompt.clone(),
            tools: agent.tools.clone(),
            model: agent.effective_model().map(String::from),
            raw_markdown: agent.raw_markdown.clone(),
            created_at_ms: agent.created_at_ms,
            updated_at_ms: agent.updated_at_ms,
        }
    }
}

/// One structured sub-agent handed to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAgentDefinition {
    pub description: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Resolved sub-agents for execution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubAgentResolution {
    #[serde(default)]
    pub structured_agents: BTreeMap<String, SubAgentDefinition>,
    #[serde(default)]
    pub raw_agents: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashCommandView {
    pub id: SlashCommandId,
    pub user_id: String,
    pub name: String,
    pub enabled: bool,
    pub mode: SlashCommandMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_markdown: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&SlashCommand> for SlashCommandView {
    fn from(command: &SlashCommand) -> Self {
        Self {
            id: command.id,
            user_id: command.user_id.clone(),
            name: command.name.clone(),
            enabled: command.enabled,
            mode: command.mode,
            content: command.content.clone(),
            allowed_tools: command.allowed_tools.clone(),
            description: command.description.clone(),
            argument_hint: command.argument_hint.clone(),
            raw_markdown: command.raw_markdown.clone(),
            created_at_ms: command.created_at_ms,
            updated_at_ms: command.updated_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: ProjectId,
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_token_env_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            user_id: project.user_id.clone(),
            name: project.name.clone(),
            repo_url: project.repo_url.clone(),
            git_branch: project.git_branch.clone(),
            git_token_env_key: project.git_token_env_key.clone(),
            description: project.description.clone(),
            created_at_ms: project.created_at_ms,
            updated_at_ms: project.updated_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTaskView {
    pub id: ScheduledTaskId,
    pub user_id: String,
    pub name: String,
    pub cron: String,
    pub prompt: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_id: Option<RunId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_status: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&ScheduledTask> for ScheduledTaskView {
    fn from(task: &ScheduledTask) -> Self {
        Self {
            id: task.id,
            user_id: task.user_id.clone(),
            name: task.name.clone(),
            cron: task.cron.clone(),
            prompt: task.prompt.clone(),
            enabled: task.enabled,
            timezone: task.timezone.clone(),
            last_run_id: task.last_run_id,
            last_run_status: task.last_run_status,
            last_error: task.last_error.clone(),
            created_at_ms: task.created_at_ms,
            updated_at_ms: task.updated_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstructionsView {
    pub enabled: bool,
    #[serde(default)]
    pub content: String,
}

impl From<&UserInstructions> for InstructionsView {
    fn from(record: &UserInstructions) -> Self {
        Self { enabled: record.enabled, content: record.content.clone() }
    }
}

/// One resolved skill entry handed to the stager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFileSpec {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
    #[serde(default)]
    pub is_prefix: bool,
}
