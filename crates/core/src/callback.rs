// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor callback wire types.
//!
//! A callback is one streaming progress/completion event. `state_patch`
//! is a full snapshot of the agent's current state and replaces the
//! session's prior snapshot wholesale.

use crate::session::WorkspaceExportStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Accepted,
    Running,
    Completed,
    Failed,
}

impl CallbackStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallbackStatus::Completed | CallbackStatus::Failed)
    }
}

crate::simple_display! {
    CallbackStatus {
        Accepted => "accepted",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub content: String,
    /// "pending" | "in_progress" | "completed"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_form: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpStatusEntry {
    pub server_name: String,
    /// "connected" | "disconnected" | "error"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    /// "added" | "modified" | "staged" | "deleted" | "renamed"
    pub status: String,
    #[serde(default)]
    pub added_lines: u32,
    #[serde(default)]
    pub deleted_lines: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default)]
    pub total_added_lines: u32,
    #[serde(default)]
    pub total_deleted_lines: u32,
    #[serde(default)]
    pub file_changes: Vec<FileChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change: Option<DateTime<Utc>>,
}

/// Full agent-state snapshot carried by callbacks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentStatePatch {
    #[serde(default)]
    pub todos: Vec<TodoItem>,
    #[serde(default)]
    pub mcp_status: Vec<McpStatusEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_state: Option<WorkspaceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
}

/// One streaming update from the executor.
///
/// `session_id` may be either the internal session id or the executor's
/// own SDK session id; the processor resolves both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    pub status: CallbackStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_patch: Option<AgentStatePatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_files_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_manifest_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_archive_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_export_status: Option<WorkspaceExportStatus>,
}

impl Callback {
    /// A minimal status-only callback.
    pub fn status_only(session_id: impl Into<String>, status: CallbackStatus, progress: u8) -> Self {
        Self {
            session_id: session_id.into(),
            time: None,
            status,
            progress: progress.min(100),
            new_message: None,
            state_patch: None,
            sdk_session_id: None,
            workspace_files_prefix: None,
            workspace_manifest_key: None,
            workspace_archive_key: None,
            workspace_export_status: None,
        }
    }

    crate::setters! {
        set {
            new_message: Option<Value>,
            state_patch: Option<AgentStatePatch>,
        }
        option {
            sdk_session_id: String,
            workspace_files_prefix: String,
            workspace_manifest_key: String,
            workspace_archive_key: String,
        }
    }

    pub fn workspace_export_status(mut self, status: WorkspaceExportStatus) -> Self {
        self.workspace_export_status = Some(status);
        self
    }
}

#[cfg(test)]
#[path = "callback_tests.rs"]
mod tests;
