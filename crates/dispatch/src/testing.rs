// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapters for tests (and other crates' tests via the
//! `test-support` feature).

use crate::api::{ApiError, ControlApi};
use crate::executor::{ExecutePayload, ExecutorAdapter, ExecutorError};
use crate::pool::{ContainerHandle, ContainerLauncher, LaunchSpec, PoolError};
use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{Callback, RunId, SessionId};
use relay_wire::{
    CallbackAck, InstructionsView, RunClaimGrant, RunClaimRequest, RunFailRequest,
    RunStartRequest, SkillFileSpec, SubAgentResolution,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Scripted control plane: claims pop from a queue, everything else is
/// recorded and answered from canned data.
#[derive(Default)]
pub struct FakeControlApi {
    pub claims: Mutex<VecDeque<RunClaimGrant>>,
    pub started: Mutex<Vec<(RunId, String)>>,
    pub failed: Mutex<Vec<(RunId, String, Option<String>)>>,
    pub callbacks: Mutex<Vec<Callback>>,
    pub env: Mutex<HashMap<String, String>>,
    pub mcp: Mutex<Map<String, Value>>,
    pub skills: Mutex<BTreeMap<String, SkillFileSpec>>,
    pub subagents: Mutex<SubAgentResolution>,
    pub commands: Mutex<BTreeMap<String, String>>,
    pub instructions: Mutex<InstructionsView>,
    pub fail_claims: AtomicBool,
}

impl FakeControlApi {
    pub fn new() -> Self {
        Self {
            instructions: Mutex::new(InstructionsView { enabled: false, content: String::new() }),
            ..Default::default()
        }
    }

    pub fn push_claim(&self, grant: RunClaimGrant) {
        self.claims.lock().push_back(grant);
    }
}

#[async_trait]
impl ControlApi for FakeControlApi {
    async fn claim_run(
        &self,
        _request: RunClaimRequest,
    ) -> Result<Option<RunClaimGrant>, ApiError> {
        if self.fail_claims.load(Ordering::SeqCst) {
            return Err(ApiError::Unavailable("scripted outage".to_string()));
        }
        Ok(self.claims.lock().pop_front())
    }

    async fn start_run(&self, run_id: &RunId, request: RunStartRequest) -> Result<(), ApiError> {
        self.started.lock().push((*run_id, request.worker_id));
        Ok(())
    }

    async fn fail_run(&self, run_id: &RunId, request: RunFailRequest) -> Result<(), ApiError> {
        self.failed.lock().push((*run_id, request.worker_id, request.error_message));
        Ok(())
    }

    async fn forward_callback(&self, callback: Callback) -> Result<CallbackAck, ApiError> {
        let session_id = callback.session_id.clone();
        self.callbacks.lock().push(callback);
        Ok(CallbackAck::received(session_id))
    }

    async fn env_map(&self, _user_id: &str) -> Result<HashMap<String, String>, ApiError> {
        Ok(self.env.lock().clone())
    }

    async fn resolve_mcp_config(
        &self,
        _user_id: &str,
        _server_ids: Vec<String>,
    ) -> Result<Map<String, Value>, ApiError> {
        Ok(self.mcp.lock().clone())
    }

    async fn resolve_skill_config(
        &self,
        _user_id: &str,
        _skill_ids: Vec<String>,
    ) -> Result<BTreeMap<String, SkillFileSpec>, ApiError> {
        Ok(self.skills.lock().clone())
    }

    async fn resolve_subagents(
        &self,
        _user_id: &str,
        _subagent_ids: Option<Vec<String>>,
    ) -> Result<SubAgentResolution, ApiError> {
        Ok(self.subagents.lock().clone())
    }

    async fn resolve_slash_commands(
        &self,
        _user_id: &str,
        _names: Vec<String>,
    ) -> Result<BTreeMap<String, String>, ApiError> {
        Ok(self.commands.lock().clone())
    }

    async fn user_instructions(&self, _user_id: &str) -> Result<InstructionsView, ApiError> {
        Ok(self.instructions.lock().clone())
    }
}

/// Records handoffs and cancels; can be scripted to reject execution.
#[derive(Default)]
pub struct FakeExecutor {
    pub executed: Mutex<Vec<(String, ExecutePayload)>>,
    pub canceled: Mutex<Vec<(String, SessionId)>>,
    pub fail_execute: AtomicBool,
    pub fail_cancel: AtomicBool,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutorAdapter for FakeExecutor {
    async fn execute(
        &self,
        executor_url: &str,
        payload: ExecutePayload,
    ) -> Result<(), ExecutorError> {
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(ExecutorError::Rejected("scripted rejection".to_string()));
        }
        self.executed.lock().push((executor_url.to_string(), payload));
        Ok(())
    }

    async fn cancel(
        &self,
        executor_url: &str,
        session_id: &SessionId,
        _reason: Option<&str>,
    ) -> Result<(), ExecutorError> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(ExecutorError::Unreachable("scripted outage".to_string()));
        }
        self.canceled.lock().push((executor_url.to_string(), *session_id));
        Ok(())
    }

    async fn health(&self, _executor_url: &str) -> Result<(), ExecutorError> {
        Ok(())
    }
}

/// Counts starts/stops and mints sequential container handles.
#[derive(Default)]
pub struct FakeLauncher {
    pub started: Mutex<Vec<LaunchSpec>>,
    pub stopped: Mutex<Vec<ContainerHandle>>,
    pub fail_start: AtomicBool,
    counter: AtomicUsize,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContainerLauncher for FakeLauncher {
    async fn start(&self, spec: LaunchSpec) -> Result<ContainerHandle, PoolError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(PoolError::StartFailed("scripted failure".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let handle = ContainerHandle {
            container_id: format!("container-{n}"),
            executor_url: format!("fake://executor-{n}"),
        };
        self.started.lock().push(spec);
        Ok(handle)
    }

    async fn stop(&self, handle: &ContainerHandle) -> Result<(), PoolError> {
        self.stopped.lock().push(handle.clone());
        Ok(())
    }
}
