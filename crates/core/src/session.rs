// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session record and status machine.
//!
//! A session is the long-lived container for one user conversation. Runs,
//! transcript messages, tool executions, and usage logs all hang off it.

use crate::callback::AgentStatePatch;
use crate::catalog::ProjectId;
use crate::clock::Clock;
use crate::config::ConfigSnapshot;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a session.
    ///
    /// Distinct from the executor's own `sdk_session_id`, which is stored
    /// alongside so later runs can resume the same agent conversation.
    pub struct SessionId("ses-");
}

/// Session lifecycle status.
///
/// `Canceled` is sticky: once set, no callback may move the session to any
/// other status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl SessionStatus {
    pub fn is_canceled(&self) -> bool {
        matches!(self, SessionStatus::Canceled)
    }
}

crate::simple_display! {
    SessionStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Canceled => "canceled",
    }
}

/// Progress of the post-completion workspace export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceExportStatus {
    Pending,
    Ready,
    Failed,
}

crate::simple_display! {
    WorkspaceExportStatus {
        Pending => "pending",
        Ready => "ready",
        Failed => "failed",
    }
}

/// Configuration for creating a new session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub id: SessionId,
    pub user_id: String,
    pub project_id: Option<ProjectId>,
    pub kind: String,
    pub config_snapshot: ConfigSnapshot,
}

impl SessionConfig {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            user_id: user_id.into(),
            project_id: None,
            kind: "chat".to_string(),
            config_snapshot: ConfigSnapshot::default(),
        }
    }

    crate::setters! {
        into {
            kind: String,
        }
        set {
            id: SessionId,
            config_snapshot: ConfigSnapshot,
        }
        option {
            project_id: ProjectId,
        }
    }
}

/// A session instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    pub kind: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub config_snapshot: ConfigSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_session_id: Option<String>,
    /// Latest full agent-state snapshot (todos, MCP statuses, file changes).
    /// Replaced wholesale by callbacks, never merged.
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
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Session {
    /// Create a new pending session.
    pub fn new(config: SessionConfig, clock: &impl Clock) -> Self {
        Self::new_with_epoch_ms(config, clock.epoch_ms())
    }

    /// Create a new session with an explicit timestamp (for WAL replay).
    pub fn new_with_epoch_ms(config: SessionConfig, epoch_ms: u64) -> Self {
        Self {
            id: config.id,
            user_id: config.user_id,
            project_id: config.project_id,
            kind: config.kind,
            status: SessionStatus::Pending,
            config_snapshot: config.config_snapshot,
            sdk_session_id: None,
            state_patch: None,
            workspace_export_status: None,
            workspace_files_prefix: None,
            workspace_manifest_key: None,
            workspace_archive_key: None,
            is_deleted: false,
            created_at_ms: epoch_ms,
            updated_at_ms: epoch_ms,
        }
    }

    /// Apply a status change, honoring the sticky-cancel rule.
    ///
    /// A canceled session only leaves that status through `Pending` (a
    /// fresh enqueue supersedes the cancel); callback-driven statuses
    /// never revive it. Returns false when the transition was suppressed.
    pub fn transition(&mut self, status: SessionStatus, epoch_ms: u64) -> bool {
        if self.status.is_canceled()
            && !matches!(status, SessionStatus::Canceled | SessionStatus::Pending)
        {
            return false;
        }
        self.status = status;
        self.updated_at_ms = epoch_ms;
        true
    }
}

crate::builder! {
    pub struct SessionBuilder => Session {
        into {
            id: SessionId = "ses-test",
            user_id: String = "u1",
            kind: String = "chat",
        }
        set {
            status: SessionStatus = SessionStatus::Pending,
            config_snapshot: ConfigSnapshot = ConfigSnapshot::default(),
            is_deleted: bool = false,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            project_id: ProjectId = None,
            sdk_session_id: String = None,
            state_patch: AgentStatePatch = None,
            workspace_export_status: WorkspaceExportStatus = None,
            workspace_files_prefix: String = None,
            workspace_manifest_key: String = None,
            workspace_archive_key: String = None,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
