// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled task records.
//!
//! Cron-to-run conversion is owned by an external dispatcher; the catalog
//! stores the definition and a `last_run_*` summary mirrored from the
//! newest run the task produced.

use crate::run::{RunId, RunStatus};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a scheduled task.
    pub struct ScheduledTaskId("sch-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
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

impl ScheduledTask {
    /// Mirror a run result onto the summary. Older runs never overwrite a
    /// newer run's result: once `last_run_id` points at a different run,
    /// only that run may update the summary.
    pub fn mirror_run(&mut self, run_id: RunId, status: RunStatus, error: Option<String>) -> bool {
        match self.last_run_id {
            Some(existing) if existing != run_id => false,
            _ => {
                self.last_run_id = Some(run_id);
                self.last_run_status = Some(status);
                self.last_error = error;
                true
            }
        }
    }

    /// Point the summary at a newly dispatched run.
    pub fn begin_run(&mut self, run_id: RunId) {
        self.last_run_id = Some(run_id);
        self.last_run_status = Some(RunStatus::Queued);
        self.last_error = None;
    }
}

crate::builder! {
    pub struct ScheduledTaskBuilder => ScheduledTask {
        into {
            id: ScheduledTaskId = "sch-test",
            user_id: String = "u1",
            name: String = "nightly-report",
            cron: String = "0 2 * * *",
            prompt: String = "Summarize yesterday.",
        }
        set {
            enabled: bool = true,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            timezone: String = None,
            last_run_id: RunId = None,
            last_run_status: RunStatus = None,
            last_error: String = None,
        }
    }
}

#[cfg(test)]
#[path = "scheduled_task_tests.rs"]
mod tests;
