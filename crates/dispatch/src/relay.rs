// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callback relay: the dispatcher-side half of the callback path.
//!
//! Executors post callbacks here; we forward them to the control plane
//! and, on terminal statuses, kick off the asynchronous workspace export
//! whose result arrives as a second callback. The executor-cancel
//! endpoint also lives here: local cancellation on the control plane
//! must succeed even when the executor (or this whole service) is
//! unreachable, so cancel is strictly best-effort.

use crate::api::{ApiError, ControlApi};
use crate::executor::ExecutorAdapter;
use crate::export::WorkspaceExporter;
use crate::pool::ContainerPool;
use crate::workspace::WorkspaceManager;
use relay_core::{Callback, Clock, SessionId, WorkspaceExportStatus};
use relay_wire::CallbackAck;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

pub struct CallbackRelay<C: Clock> {
    api: Arc<dyn ControlApi>,
    executor: Arc<dyn ExecutorAdapter>,
    pool: Arc<ContainerPool>,
    workspace: Arc<WorkspaceManager>,
    exporter: Arc<WorkspaceExporter<C>>,
    cancel_timeout: Duration,
    exports: TaskTracker,
}

impl<C: Clock + 'static> CallbackRelay<C> {
    pub fn new(
        api: Arc<dyn ControlApi>,
        executor: Arc<dyn ExecutorAdapter>,
        pool: Arc<ContainerPool>,
        workspace: Arc<WorkspaceManager>,
        exporter: Arc<WorkspaceExporter<C>>,
        cancel_timeout: Duration,
    ) -> Self {
        Self {
            api,
            executor,
            pool,
            workspace,
            exporter,
            cancel_timeout,
            exports: TaskTracker::new(),
        }
    }

    /// Relay one executor callback to the control plane. Terminal
    /// statuses (without an export result attached) spawn the export
    /// job.
    pub async fn process_callback(self: &Arc<Self>, callback: Callback) -> Result<CallbackAck, ApiError> {
        tracing::info!(
            session = %callback.session_id,
            status = %callback.status,
            progress = callback.progress,
            "callback received"
        );

        let spawn_export =
            callback.status.is_terminal() && callback.workspace_export_status.is_none();
        let session_key = callback.session_id.clone();
        let terminal_status = callback.status;

        let ack = self.api.forward_callback(callback).await.map_err(|e| {
            tracing::error!(session = %session_key, error = %e, "failed to forward callback");
            e
        })?;

        if spawn_export {
            // The control plane resolved the session id for us; export
            // under the internal id so workspace lookup works.
            let session_id = ack.session_id.clone();
            let relay = Arc::clone(self);
            self.exports.spawn(async move {
                relay.run_export(&session_id, terminal_status).await;
            });
        }
        Ok(ack)
    }

    /// Export the workspace and report the result as a follow-up
    /// callback. The follow-up repeats the run's terminal status so it
    /// never rewrites a failed session as completed.
    async fn run_export(&self, session_id: &str, status: relay_core::CallbackStatus) {
        let result = self.exporter.export(&self.workspace, session_id).await;
        let mut callback = Callback::status_only(session_id, status, 100);
        match result {
            Ok(export) => {
                callback.workspace_export_status = Some(WorkspaceExportStatus::Ready);
                callback.workspace_files_prefix = Some(export.files_prefix);
                callback.workspace_manifest_key = Some(export.manifest_key);
                callback.workspace_archive_key = Some(export.archive_key);
            }
            Err(e) => {
                tracing::error!(session = session_id, error = %e, "workspace export failed");
                callback.workspace_export_status = Some(WorkspaceExportStatus::Failed);
            }
        }
        if let Err(e) = self.api.forward_callback(callback).await {
            tracing::error!(session = session_id, error = %e, "failed to report export result");
        }
    }

    /// Best-effort executor cancel for a session. Returns whether the
    /// executor was actually told; the caller's local cancel has already
    /// committed either way.
    pub async fn cancel_executor(&self, session_id: &SessionId, reason: Option<&str>) -> bool {
        let Some(handle) = self.pool.lookup(session_id) else {
            tracing::info!(session = %session_id, "no live container to cancel");
            return false;
        };

        let told = tokio::time::timeout(
            self.cancel_timeout,
            self.executor.cancel(&handle.executor_url, session_id, reason),
        )
        .await;

        let notified = matches!(told, Ok(Ok(())));
        if !notified {
            tracing::warn!(session = %session_id, "executor cancel did not succeed");
        }

        self.pool.release(session_id).await;
        notified
    }

    /// Wait for outstanding export jobs (shutdown path).
    pub async fn drain(&self) {
        self.exports.close();
        self.exports.wait().await;
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
