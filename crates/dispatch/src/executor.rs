// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The executor contract: an opaque per-session sandboxed runtime with a
//! small execute/cancel/health surface.

use crate::resolver::ResolvedConfig;
use async_trait::async_trait;
use relay_core::{PermissionMode, RunId, SessionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("executor unreachable: {0}")]
    Unreachable(String),
    #[error("executor rejected task: {0}")]
    Rejected(String),
}

/// The handoff payload. Fire-and-forget at the HTTP level: the executor
/// acknowledges receipt and streams progress via callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutePayload {
    pub session_id: SessionId,
    pub run_id: RunId,
    pub prompt: String,
    pub callback_url: String,
    pub callback_token: String,
    pub config: ResolvedConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_session_id: Option<String>,
    pub permission_mode: PermissionMode,
}

/// Start/cancel/health API of one executor instance.
#[async_trait]
pub trait ExecutorAdapter: Send + Sync {
    /// Hand a task to the executor at `executor_url`.
    async fn execute(&self, executor_url: &str, payload: ExecutePayload)
        -> Result<(), ExecutorError>;

    /// Ask the executor to stop everything for a session. Best effort.
    async fn cancel(
        &self,
        executor_url: &str,
        session_id: &SessionId,
        reason: Option<&str>,
    ) -> Result<(), ExecutorError>;

    async fn health(&self, executor_url: &str) -> Result<(), ExecutorError>;
}
