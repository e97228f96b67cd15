// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule-mode pullers: long-poll the run queue under leases and drive
//! the claim → resolve → stage → acquire → handoff pipeline.
//!
//! A semaphore permit is taken *before* each claim, so the dispatcher
//! never pulls more work than it can run; the permit is released
//! deterministically when the dispatch task finishes, success or not.

use crate::api::ControlApi;
use crate::env::Settings;
use crate::error::DispatchError;
use crate::executor::{ExecutePayload, ExecutorAdapter};
use crate::pool::{ContainerMode, ContainerPool, LaunchSpec};
use crate::resolver::ConfigResolver;
use crate::stage::{AttachmentStager, InstructionsStager, SkillStager, SlashCommandStager};
use crate::workspace::WorkspaceManager;
use crate::blob::BlobStore;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use parking_lot::Mutex;
use relay_core::config::keys;
use relay_core::{Clock, ScheduleMode};
use relay_wire::{RunClaimGrant, RunClaimRequest, RunFailRequest, RunStartRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Window id used by the self-arming nightly loop.
pub const NIGHTLY_WINDOW_ID: &str = "nightly";

pub struct RunPuller<C: Clock> {
    api: Arc<dyn ControlApi>,
    executor: Arc<dyn ExecutorAdapter>,
    pool: Arc<ContainerPool>,
    workspace: Arc<WorkspaceManager>,
    resolver: ConfigResolver,
    skill_stager: SkillStager,
    attachment_stager: AttachmentStager,
    settings: Settings,
    clock: C,
    slots: Arc<Semaphore>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    /// Open claim windows: window id → claimable-until (UTC).
    windows_until: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl<C: Clock + 'static> RunPuller<C> {
    pub fn new(
        api: Arc<dyn ControlApi>,
        executor: Arc<dyn ExecutorAdapter>,
        pool: Arc<ContainerPool>,
        blob: Arc<dyn BlobStore>,
        workspace: Arc<WorkspaceManager>,
        settings: Settings,
        clock: C,
    ) -> Self {
        let default_model =
            Some(settings.default_model.clone()).filter(|m| !m.is_empty());
        Self {
            resolver: ConfigResolver::new(api.clone(), default_model),
            skill_stager: SkillStager::new(blob.clone()),
            attachment_stager: AttachmentStager::new(blob),
            slots: Arc::new(Semaphore::new(settings.max_concurrent_tasks.max(1))),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            windows_until: Mutex::new(HashMap::new()),
            api,
            executor,
            pool,
            workspace,
            settings,
            clock,
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Poll the queue and dispatch as many runs as free slots allow.
    pub async fn poll(self: &Arc<Self>, schedule_modes: Option<Vec<ScheduleMode>>) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let lease_seconds = self.settings.task_claim_lease_seconds.max(5);

        loop {
            let Ok(permit) = self.slots.clone().try_acquire_owned() else {
                return;
            };

            let claim = match self
                .api
                .claim_run(RunClaimRequest {
                    worker_id: self.settings.worker_id.clone(),
                    lease_seconds,
                    schedule_modes: schedule_modes.clone(),
                })
                .await
            {
                Ok(claim) => claim,
                Err(e) => {
                    tracing::error!(error = %e, "failed to claim run from control plane");
                    return;
                }
            };

            let Some(grant) = claim else {
                return;
            };

            let puller = Arc::clone(self);
            self.tracker.spawn(async move {
                let run_id = grant.run.run_id;
                if let Err(e) = puller.handle_claim(grant).await {
                    tracing::error!(run = %run_id, error = %e, "run dispatch failed");
                }
                drop(permit);
            });
        }
    }

    /// Open a claim window: nightly (and similar) runs become claimable
    /// until `now + window_minutes`, and a poll fires immediately.
    pub async fn open_window(
        self: &Arc<Self>,
        window_id: &str,
        schedule_modes: Option<Vec<ScheduleMode>>,
        window_minutes: u32,
    ) {
        let window_id = window_id.trim();
        if window_id.is_empty() || self.shutdown.is_cancelled() {
            return;
        }
        let minutes = if window_minutes == 0 { 60 } else { window_minutes };
        let until = self.clock.now_utc() + ChronoDuration::minutes(minutes as i64);
        self.windows_until.lock().insert(window_id.to_string(), until);
        tracing::info!(window = window_id, until = %until, "window opened");

        self.poll(schedule_modes).await;
    }

    /// Poll only while the window is open; expired windows are removed.
    pub async fn poll_window(
        self: &Arc<Self>,
        window_id: &str,
        schedule_modes: Option<Vec<ScheduleMode>>,
    ) {
        let window_id = window_id.trim();
        if window_id.is_empty() || self.shutdown.is_cancelled() {
            return;
        }
        {
            let mut windows = self.windows_until.lock();
            match windows.get(window_id) {
                None => return,
                Some(until) if self.clock.now_utc() >= *until => {
                    windows.remove(window_id);
                    tracing::info!(window = window_id, "window closed");
                    return;
                }
                Some(_) => {}
            }
        }
        self.poll(schedule_modes).await;
    }

    /// Whether a window is currently open.
    pub fn window_open(&self, window_id: &str) -> bool {
        self.windows_until
            .lock()
            .get(window_id)
            .is_some_and(|until| self.clock.now_utc() < *until)
    }

    /// Run the three pullers until shutdown.
    pub async fn run(self: Arc<Self>) {
        let interval = self.settings.task_pull_interval.max(Duration::from_millis(100));
        tracing::info!(
            worker = %self.settings.worker_id,
            lease = self.settings.task_claim_lease_seconds,
            max_concurrent = self.settings.max_concurrent_tasks,
            "run puller started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            if self.settings.task_pull_immediate_enabled {
                self.poll(Some(vec![ScheduleMode::Immediate])).await;
            }
            if self.settings.task_pull_scheduled_enabled {
                self.poll(Some(vec![ScheduleMode::Scheduled])).await;
            }
            if self.settings.task_pull_nightly_enabled {
                self.nightly_tick().await;
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("run puller stopped");
    }

    /// Self-arming nightly window: opens at the configured UTC start and
    /// polls while open.
    async fn nightly_tick(self: &Arc<Self>) {
        let now = self.clock.now_utc();
        let start = self.settings.nightly_start_hour * 60 + self.settings.nightly_start_minute;
        let minute_of_day = now.hour() * 60 + now.minute();
        let in_window = {
            let end = start + self.settings.nightly_window_minutes;
            if end <= 24 * 60 {
                minute_of_day >= start && minute_of_day < end
            } else {
                minute_of_day >= start || minute_of_day < end % (24 * 60)
            }
        };

        if in_window && !self.window_open(NIGHTLY_WINDOW_ID) {
            // Remaining minutes of the window, so late restarts don't
            // extend it past the configured end.
            let elapsed =
                (minute_of_day + 24 * 60 - start) % (24 * 60);
            let remaining = self.settings.nightly_window_minutes.saturating_sub(elapsed).max(1);
            self.open_window(NIGHTLY_WINDOW_ID, Some(vec![ScheduleMode::Nightly]), remaining)
                .await;
        } else {
            self.poll_window(NIGHTLY_WINDOW_ID, Some(vec![ScheduleMode::Nightly])).await;
        }
    }

    /// The dispatch pipeline for one claimed run.
    pub async fn handle_claim(&self, grant: RunClaimGrant) -> Result<(), DispatchError> {
        let run_id = grant.run.run_id;
        let session_id = grant.run.session_id;
        let user_id = grant.user_id.clone();

        if user_id.is_empty() || grant.prompt.is_empty() {
            return Err(DispatchError::InvalidClaim(format!(
                "missing user or prompt for run {run_id}"
            )));
        }

        let result = self.dispatch(&grant).await;
        if let Err(e) = result {
            let message = e.to_string();
            if let Err(fail_err) = self
                .api
                .fail_run(
                    &run_id,
                    RunFailRequest {
                        worker_id: self.settings.worker_id.clone(),
                        error_message: Some(message.clone()),
                    },
                )
                .await
            {
                tracing::error!(run = %run_id, error = %fail_err, "failed to mark run as failed");
            }
            self.pool.release(&session_id).await;
            return Err(e);
        }

        tracing::info!(run = %run_id, session = %session_id, "run dispatched");
        Ok(())
    }

    async fn dispatch(&self, grant: &RunClaimGrant) -> Result<(), DispatchError> {
        let run_id = grant.run.run_id;
        let session_id = grant.run.session_id;
        let user_id = &grant.user_id;
        let snapshot = &grant.config_snapshot;

        let container_mode = ContainerMode::parse(snapshot.container_mode());
        let container_hint = snapshot.str_field(keys::CONTAINER_ID).map(String::from);

        let mut resolved = self.resolver.resolve(user_id, snapshot).await?;

        self.workspace
            .prepare(
                user_id,
                session_id.as_str(),
                &container_mode.to_string(),
                self.clock.now_utc(),
            )
            .map_err(|e| DispatchError::workspace(e.to_string()))?;

        let staged_skills = self
            .skill_stager
            .stage_skills(&self.workspace, user_id, session_id.as_str(), &mut resolved.skill_files)
            .await?;

        let inputs: Vec<Value> = std::mem::take(&mut resolved.input_files);
        resolved.input_files = self
            .attachment_stager
            .stage_inputs(&self.workspace, user_id, session_id.as_str(), &inputs)
            .await?;

        let commands = self.api.resolve_slash_commands(user_id, Vec::new()).await?;
        let staged_commands = SlashCommandStager
            .stage_commands(&self.workspace, user_id, session_id.as_str(), &commands)
            .await?;

        // Persistent instructions are best-effort: a failure here must
        // not block execution.
        match self.api.user_instructions(user_id).await {
            Ok(instructions) => {
                if let Err(e) = InstructionsStager
                    .stage(
                        &self.workspace,
                        user_id,
                        session_id.as_str(),
                        instructions.enabled,
                        &instructions.content,
                    )
                    .await
                {
                    tracing::warn!(session = %session_id, error = %e, "failed to stage instructions");
                }
            }
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "failed to fetch instructions");
            }
        }

        tracing::debug!(
            run = %run_id,
            skills = staged_skills,
            inputs = resolved.input_files.len(),
            commands = staged_commands,
            "workspace staged"
        );

        let workspace_path = self
            .workspace
            .workspace_dir(user_id, session_id.as_str())
            .ok_or_else(|| DispatchError::workspace("workspace vanished during staging"))?;

        let deadline = self.lease_deadline(grant);
        let handle = self
            .pool
            .acquire(
                LaunchSpec {
                    session_id,
                    user_id: user_id.clone(),
                    workspace_path,
                    env: resolved.env.clone(),
                    browser_enabled: resolved.browser_enabled,
                    mode: container_mode,
                    container_id: container_hint,
                },
                deadline,
            )
            .await
            .map_err(|e| DispatchError::ContainerStart(e.to_string()))?;

        let payload = ExecutePayload {
            session_id,
            run_id,
            prompt: grant.prompt.clone(),
            callback_url: self.settings.callback_url(),
            callback_token: self.settings.callback_token.clone(),
            config: resolved,
            sdk_session_id: grant.sdk_session_id.clone(),
            permission_mode: grant.run.permission_mode,
        };

        tokio::time::timeout(
            self.settings.executor_handoff_timeout,
            self.executor.execute(&handle.executor_url, payload),
        )
        .await
        .map_err(|_| DispatchError::Handoff("executor handoff timed out".to_string()))?
        .map_err(|e| DispatchError::Handoff(e.to_string()))?;

        if let Err(e) = self
            .api
            .start_run(
                &run_id,
                RunStartRequest { worker_id: self.settings.worker_id.clone() },
            )
            .await
        {
            tracing::error!(run = %run_id, error = %e, "failed to mark run as running");
        }
        Ok(())
    }

    /// How long the dispatch may wait on container capacity before the
    /// lease is at risk.
    fn lease_deadline(&self, grant: &RunClaimGrant) -> Duration {
        let now = self.clock.epoch_ms();
        grant
            .run
            .lease_expires_at_ms
            .and_then(|expires| expires.checked_sub(now))
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_secs(self.settings.task_claim_lease_seconds as u64))
            .min(self.settings.executor_handoff_timeout)
            .max(Duration::from_millis(100))
    }

    /// Graceful shutdown: stop pulling, wait for in-flight dispatches.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Wait until no dispatch task is in flight (tests).
    #[cfg(any(test, feature = "test-support"))]
    pub async fn tracker_wait(&self) {
        while !self.tracker.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[cfg(test)]
#[path = "puller_tests.rs"]
mod tests;
