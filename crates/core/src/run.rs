// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run record, schedule modes, and the claim/lease state machine.

use crate::catalog::ScheduledTaskId;
use crate::clock::Clock;
use crate::config::ConfigSnapshot;
use crate::message::MessageId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for one execution attempt within a session.
    pub struct RunId("run-");
}

/// Run lifecycle status.
///
/// Transitions are monotonic (`queued → claimed → running → terminal`)
/// except that an expired lease moves `claimed`/`running` back to
/// `claimed` under a new owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Claimed,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed | RunStatus::Canceled)
    }
}

crate::simple_display! {
    RunStatus {
        Queued => "queued",
        Claimed => "claimed",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Canceled => "canceled",
    }
}

/// Which puller may claim the run, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    Immediate,
    Scheduled,
    Nightly,
}

crate::simple_display! {
    ScheduleMode {
        Immediate => "immediate",
        Scheduled => "scheduled",
        Nightly => "nightly",
    }
}

/// Permission mode handed to the executor verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionMode {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "acceptEdits")]
    AcceptEdits,
    #[serde(rename = "plan")]
    Plan,
    #[serde(rename = "bypassPermissions")]
    BypassPermissions,
}

impl PermissionMode {
    /// Parse the wire value; empty or missing input falls back to `Default`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "default" => Some(PermissionMode::Default),
            "acceptEdits" => Some(PermissionMode::AcceptEdits),
            "plan" => Some(PermissionMode::Plan),
            "bypassPermissions" => Some(PermissionMode::BypassPermissions),
            _ => None,
        }
    }
}

crate::simple_display! {
    PermissionMode {
        Default => "default",
        AcceptEdits => "acceptEdits",
        Plan => "plan",
        BypassPermissions => "bypassPermissions",
    }
}

/// Configuration for creating a new run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub id: RunId,
    pub session_id: SessionId,
    pub user_message_id: MessageId,
    pub schedule_mode: ScheduleMode,
    pub scheduled_at_ms: Option<u64>,
    pub permission_mode: PermissionMode,
    pub config_snapshot: ConfigSnapshot,
    pub scheduled_task_id: Option<ScheduledTaskId>,
}

impl RunConfig {
    pub fn new(session_id: SessionId, user_message_id: MessageId) -> Self {
        Self {
            id: RunId::new(),
            session_id,
            user_message_id,
            schedule_mode: ScheduleMode::Immediate,
            scheduled_at_ms: None,
            permission_mode: PermissionMode::Default,
            config_snapshot: ConfigSnapshot::default(),
            scheduled_task_id: None,
        }
    }

    crate::setters! {
        set {
            id: RunId,
            schedule_mode: ScheduleMode,
            permission_mode: PermissionMode,
            config_snapshot: ConfigSnapshot,
        }
        option {
            scheduled_at_ms: u64,
            scheduled_task_id: ScheduledTaskId,
        }
    }
}

/// One execution attempt within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub session_id: SessionId,
    pub user_message_id: MessageId,
    pub status: RunStatus,
    pub schedule_mode: ScheduleMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at_ms: Option<u64>,
    #[serde(default)]
    pub config_snapshot: ConfigSnapshot,
    #[serde(default)]
    pub permission_mode: PermissionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_expires_at_ms: Option<u64>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub progress: u8,
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

impl Run {
    /// Create a new queued run.
    pub fn new(config: RunConfig, clock: &impl Clock) -> Self {
        Self::new_with_epoch_ms(config, clock.epoch_ms())
    }

    /// Create a new run with an explicit timestamp (for WAL replay).
    pub fn new_with_epoch_ms(config: RunConfig, epoch_ms: u64) -> Self {
        Self {
            id: config.id,
            session_id: config.session_id,
            user_message_id: config.user_message_id,
            status: RunStatus::Queued,
            schedule_mode: config.schedule_mode,
            scheduled_at_ms: config.scheduled_at_ms,
            config_snapshot: config.config_snapshot,
            permission_mode: config.permission_mode,
            claimed_by: None,
            lease_expires_at_ms: None,
            attempts: 0,
            progress: 0,
            last_error: None,
            scheduled_task_id: config.scheduled_task_id,
            started_at_ms: None,
            finished_at_ms: None,
            created_at_ms: epoch_ms,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True when the run can be handed to a worker right now.
    ///
    /// Queued runs are claimable once due; claimed/running runs only after
    /// their lease expired (silent worker death recovery).
    pub fn is_claimable(&self, now_ms: u64) -> bool {
        match self.status {
            RunStatus::Queued => true,
            RunStatus::Claimed | RunStatus::Running => {
                self.lease_expires_at_ms.is_some_and(|exp| exp <= now_ms)
            }
            _ => false,
        }
    }

    /// Claim ordering key: scheduled runs by due time, immediate/nightly by
    /// arrival; arrival breaks ties.
    pub fn claim_order_key(&self) -> (u64, u64) {
        (self.scheduled_at_ms.unwrap_or(self.created_at_ms), self.created_at_ms)
    }

    /// Take ownership under a fresh lease.
    pub fn claim(&mut self, worker_id: &str, lease_expires_at_ms: u64) {
        self.status = RunStatus::Claimed;
        self.claimed_by = Some(worker_id.to_string());
        self.lease_expires_at_ms = Some(lease_expires_at_ms);
        self.attempts += 1;
    }

    /// Move into a terminal status, recording the finish time and dropping
    /// the lease. Completion forces progress to 100.
    pub fn finish(&mut self, status: RunStatus, epoch_ms: u64) {
        self.status = status;
        self.finished_at_ms = Some(epoch_ms);
        self.claimed_by = None;
        self.lease_expires_at_ms = None;
        if status == RunStatus::Completed {
            self.progress = 100;
        }
    }
}

crate::builder! {
    pub struct RunBuilder => Run {
        into {
            id: RunId = "run-test",
            session_id: SessionId = "ses-test",
            user_message_id: MessageId = "msg-test",
        }
        set {
            status: RunStatus = RunStatus::Queued,
            schedule_mode: ScheduleMode = ScheduleMode::Immediate,
            config_snapshot: ConfigSnapshot = ConfigSnapshot::default(),
            permission_mode: PermissionMode = PermissionMode::Default,
            attempts: u32 = 0,
            progress: u8 = 0,
            created_at_ms: u64 = 1_000_000,
        }
        option {
            scheduled_at_ms: u64 = None,
            claimed_by: String = None,
            lease_expires_at_ms: u64 = None,
            last_error: String = None,
            scheduled_task_id: ScheduledTaskId = None,
            started_at_ms: u64 = None,
            finished_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
