// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled task catalog.
//!
//! Cron-to-run conversion is owned by an external dispatcher; here live
//! the records, and runs produced by a task mirror their latest status
//! onto it through the callback/cancel paths.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{Clock, Event, ScheduledTask, ScheduledTaskId};
use relay_wire::{ScheduledTaskCreateRequest, ScheduledTaskUpdateRequest, ScheduledTaskView};

impl<C: Clock> Control<C> {
    pub fn list_scheduled_tasks(
        &self,
        ctx: &RequestCtx,
    ) -> Result<Vec<ScheduledTaskView>, ControlError> {
        Ok(self.store.read(|state| {
            let mut tasks: Vec<&ScheduledTask> =
                state.scheduled_tasks.values().filter(|t| t.user_id == ctx.user_id).collect();
            tasks.sort_by(|a, b| {
                b.created_at_ms.cmp(&a.created_at_ms).then(a.name.cmp(&b.name))
            });
            tasks.into_iter().map(ScheduledTaskView::from).collect()
        }))
    }

    pub fn create_scheduled_task(
        &self,
        ctx: &RequestCtx,
        request: ScheduledTaskCreateRequest,
    ) -> Result<ScheduledTaskView, ControlError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ControlError::bad_request("Scheduled task name cannot be empty"));
        }
        let cron = request.cron.trim().to_string();
        if cron.is_empty() {
            return Err(ControlError::bad_request("cron cannot be empty"));
        }
        let prompt = request.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(ControlError::bad_request("Prompt cannot be empty"));
        }
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            let taken =
                state.scheduled_tasks.values().any(|t| t.name == name && t.user_id == ctx.user_id);
            if taken {
                return Err(ControlError::conflict(format!(
                    "Scheduled task already exists: {name}"
                )));
            }
            let task = ScheduledTask {
                id: ScheduledTaskId::new(),
                user_id: ctx.user_id.clone(),
                name: name.clone(),
                cron,
                prompt,
                enabled: request.enabled,
                timezone: request.timezone.clone(),
                last_run_id: None,
                last_run_status: None,
                last_error: None,
                created_at_ms: now,
                updated_at_ms: now,
            };
            let view = ScheduledTaskView::from(&task);
            Ok((vec![Event::ScheduledTaskUpserted { task }], view))
        })
    }

    pub fn update_scheduled_task(
        &self,
        ctx: &RequestCtx,
        task_id: &ScheduledTaskId,
        request: ScheduledTaskUpdateRequest,
    ) -> Result<ScheduledTaskView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let mut task = match state.scheduled_tasks.get(task_id) {
                Some(task) if task.user_id == ctx.user_id => task.clone(),
                _ => {
                    return Err(ControlError::not_found(format!(
                        "Scheduled task not found: {task_id}"
                    )));
                }
            };

            if let Some(name) = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                if name != task.name {
                    let taken = state
                        .scheduled_tasks
                        .values()
                        .any(|t| t.id != task.id && t.name == name && t.user_id == ctx.user_id);
                    if taken {
                        return Err(ControlError::conflict(format!(
                            "Scheduled task already exists: {name}"
                        )));
                    }
                    task.name = name.to_string();
                }
            }
            if let Some(cron) = request.cron.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                task.cron = cron.to_string();
            }
            if let Some(prompt) =
                request.prompt.as_deref().map(str::trim).filter(|p| !p.is_empty())
            {
                task.prompt = prompt.to_string();
            }
            if let Some(enabled) = request.enabled {
                task.enabled = enabled;
            }
            if let Some(timezone) = &request.timezone {
                task.timezone = Some(timezone.clone()).filter(|t| !t.trim().is_empty());
            }
            task.updated_at_ms = now;

            let view = ScheduledTaskView::from(&task);
            Ok((vec![Event::ScheduledTaskUpserted { task }], view))
        })
    }

    pub fn delete_scheduled_task(
        &self,
        ctx: &RequestCtx,
        task_id: &ScheduledTaskId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            match state.scheduled_tasks.get(task_id) {
                Some(task) if task.user_id == ctx.user_id => {
                    Ok((vec![Event::ScheduledTaskDeleted { id: task.id }], ()))
                }
                _ => Err(ControlError::not_found(format!(
                    "Scheduled task not found: {task_id}"
                ))),
            }
        })
    }
}
