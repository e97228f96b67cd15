// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-keyed executor container pool.
//!
//! One live container per session, reused across that session's runs.
//! A global capacity semaphore caps concurrent containers; acquisition
//! blocks until a slot frees or the caller's deadline passes (in which
//! case the dispatch fails and the run is re-claimed later).

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("container start failed: {0}")]
    StartFailed(String),
    #[error("container pool saturated")]
    Saturated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerMode {
    Ephemeral,
    Persistent,
}

impl ContainerMode {
    pub fn parse(value: &str) -> Self {
        if value == "persistent" {
            ContainerMode::Persistent
        } else {
            ContainerMode::Ephemeral
        }
    }
}

relay_core::simple_display! {
    ContainerMode {
        Ephemeral => "ephemeral",
        Persistent => "persistent",
    }
}

/// A running executor instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub container_id: String,
    pub executor_url: String,
}

/// What the launcher needs to start an instance.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub session_id: SessionId,
    pub user_id: String,
    /// Host path bind-mounted as the container workspace.
    pub workspace_path: std::path::PathBuf,
    pub env: HashMap<String, String>,
    pub browser_enabled: bool,
    pub mode: ContainerMode,
    /// Reattach hint from a previous run of a persistent session.
    pub container_id: Option<String>,
}

/// Starts and stops executor instances (docker, k8s, ...). Deployment
/// plumbing lives behind this seam.
#[async_trait]
pub trait ContainerLauncher: Send + Sync {
    async fn start(&self, spec: LaunchSpec) -> Result<ContainerHandle, PoolError>;
    async fn stop(&self, handle: &ContainerHandle) -> Result<(), PoolError>;
}

struct Entry {
    handle: ContainerHandle,
    mode: ContainerMode,
    _permit: OwnedSemaphorePermit,
}

pub struct ContainerPool {
    launcher: Arc<dyn ContainerLauncher>,
    entries: Mutex<HashMap<SessionId, Arc<Entry>>>,
    capacity: Arc<Semaphore>,
}

impl ContainerPool {
    pub fn new(launcher: Arc<dyn ContainerLauncher>, max_containers: usize) -> Self {
        Self {
            launcher,
            entries: Mutex::new(HashMap::new()),
            capacity: Arc::new(Semaphore::new(max_containers.max(1))),
        }
    }

    /// Reuse the session's live container or start a new one. `deadline`
    /// bounds how long we wait for capacity.
    pub async fn acquire(
        &self,
        spec: LaunchSpec,
        deadline: Duration,
    ) -> Result<ContainerHandle, PoolError> {
        if let Some(entry) = self.entries.lock().get(&spec.session_id) {
            return Ok(entry.handle.clone());
        }

        let permit = tokio::time::timeout(deadline, self.capacity.clone().acquire_owned())
            .await
            .map_err(|_| PoolError::Saturated)?
            .map_err(|_| PoolError::Saturated)?;

        // A racing dispatch for the same session may have won; reuse its
        // container and drop our permit.
        if let Some(entry) = self.entries.lock().get(&spec.session_id) {
            return Ok(entry.handle.clone());
        }

        let session_id = spec.session_id;
        let mode = spec.mode;
        let handle = self.launcher.start(spec).await?;
        tracing::info!(
            session = %session_id,
            container = %handle.container_id,
            %mode,
            "container started"
        );
        self.entries.lock().insert(
            session_id,
            Arc::new(Entry { handle: handle.clone(), mode, _permit: permit }),
        );
        Ok(handle)
    }

    /// The live container for a session, if any.
    pub fn lookup(&self, session_id: &SessionId) -> Option<ContainerHandle> {
        self.entries.lock().get(session_id).map(|e| e.handle.clone())
    }

    /// Stop and forget a session's container (cancel or dispatch
    /// failure). Best effort; the slot frees either way.
    pub async fn release(&self, session_id: &SessionId) -> Option<ContainerHandle> {
        let entry = self.entries.lock().remove(session_id)?;
        if let Err(e) = self.launcher.stop(&entry.handle).await {
            tracing::warn!(
                session = %session_id,
                container = %entry.handle.container_id,
                error = %e,
                "container stop failed"
            );
        }
        Some(entry.handle.clone())
    }

    /// Drop ephemeral containers when their run finishes; persistent
    /// ones stay warm for the session's next run.
    pub async fn release_if_ephemeral(&self, session_id: &SessionId) {
        let is_ephemeral = self
            .entries
            .lock()
            .get(session_id)
            .is_some_and(|e| e.mode == ContainerMode::Ephemeral);
        if is_ephemeral {
            self.release(session_id).await;
        }
    }

    pub fn live_count(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
