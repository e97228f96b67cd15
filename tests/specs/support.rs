// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures: a full in-process deployment wiring the control
//! plane behind the dispatcher's `ControlApi` seam, with fake executor
//! and container launcher.

use async_trait::async_trait;
use relay_control::{Control, ControlError, QueueConfig, RequestCtx};
use relay_core::{Callback, FakeClock, RunId, SessionId};
use relay_dispatch::api::{ApiError, ControlApi};
use relay_dispatch::blob::FsBlobStore;
use relay_dispatch::pool::ContainerPool;
use relay_dispatch::testing::{FakeExecutor, FakeLauncher};
use relay_dispatch::{
    CallbackRelay, RunPuller, Settings, WorkspaceExporter, WorkspaceManager,
};
use relay_storage::Store;
use relay_wire::{
    CallbackAck, InstructionsView, RunClaimGrant, RunClaimRequest, RunFailRequest,
    RunStartRequest, SkillFileSpec, SubAgentResolution, TaskEnqueueRequest,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

pub const WORKER: &str = "w1";

/// In-process binding of the dispatcher's control-plane seam.
pub struct LocalControlApi {
    control: Arc<Control<FakeClock>>,
}

impl LocalControlApi {
    pub fn new(control: Arc<Control<FakeClock>>) -> Self {
        Self { control }
    }
}

fn api_err(e: ControlError) -> ApiError {
    ApiError::Rejected { code: e.kind().code(), message: e.to_string() }
}

#[async_trait]
impl ControlApi for LocalControlApi {
    async fn claim_run(
        &self,
        request: RunClaimRequest,
    ) -> Result<Option<RunClaimGrant>, ApiError> {
        self.control.claim_run(&RequestCtx::new("worker"), request).map_err(api_err)
    }

    async fn start_run(&self, run_id: &RunId, request: RunStartRequest) -> Result<(), ApiError> {
        self.control
            .start_run(&RequestCtx::new("worker"), run_id, request)
            .map(|_| ())
            .map_err(api_err)
    }

    async fn fail_run(&self, run_id: &RunId, request: RunFailRequest) -> Result<(), ApiError> {
        self.control
            .fail_run(&RequestCtx::new("worker"), run_id, request)
            .map(|_| ())
            .map_err(api_err)
    }

    async fn forward_callback(&self, callback: Callback) -> Result<CallbackAck, ApiError> {
        self.control.process_callback(callback).map_err(api_err)
    }

    async fn env_map(&self, user_id: &str) -> Result<HashMap<String, String>, ApiError> {
        self.control.env_map(&RequestCtx::new(user_id)).map_err(api_err)
    }

    async fn resolve_mcp_config(
        &self,
        user_id: &str,
        server_ids: Vec<String>,
    ) -> Result<Map<String, Value>, ApiError> {
        self.control
            .resolve_mcp_config(
                &RequestCtx::new(user_id),
                relay_wire::McpConfigResolveRequest { server_ids },
            )
            .map_err(api_err)
    }

    async fn resolve_skill_config(
        &self,
        user_id: &str,
        skill_ids: Vec<String>,
    ) -> Result<BTreeMap<String, SkillFileSpec>, ApiError> {
        self.control
            .resolve_skill_config(
                &RequestCtx::new(user_id),
                relay_wire::SkillConfigResolveRequest { skill_ids },
            )
            .map_err(api_err)
    }

    async fn resolve_subagents(
        &self,
        user_id: &str,
        subagent_ids: Option<Vec<String>>,
    ) -> Result<SubAgentResolution, ApiError> {
        self.control
            .resolve_subagents(
                &RequestCtx::new(user_id),
                relay_wire::SubAgentResolveRequest { subagent_ids },
            )
            .map_err(api_err)
    }

    async fn resolve_slash_commands(
        &self,
        user_id: &str,
        names: Vec<String>,
    ) -> Result<BTreeMap<String, String>, ApiError> {
        self.control
            .resolve_slash_commands(
                &RequestCtx::new(user_id),
                relay_wire::SlashCommandResolveRequest { names },
            )
            .map_err(api_err)
    }

    async fn user_instructions(&self, user_id: &str) -> Result<InstructionsView, ApiError> {
        self.control.get_instructions(&RequestCtx::new(user_id)).map_err(api_err)
    }
}

/// A complete in-process deployment.
pub struct Deployment {
    pub control: Arc<Control<FakeClock>>,
    pub clock: FakeClock,
    pub api: Arc<LocalControlApi>,
    pub executor: Arc<FakeExecutor>,
    pub launcher: Arc<FakeLauncher>,
    pub blob: Arc<FsBlobStore>,
    pub workspace: Arc<WorkspaceManager>,
    pub pool: Arc<ContainerPool>,
    pub puller: Arc<RunPuller<FakeClock>>,
    pub relay: Arc<CallbackRelay<FakeClock>>,
    _dirs: (tempfile::TempDir, tempfile::TempDir, tempfile::TempDir),
}

pub fn deployment() -> Deployment {
    deployment_with_queue(QueueConfig::default())
}

pub fn deployment_with_queue(queue: QueueConfig) -> Deployment {
    let state_dir = tempfile::tempdir().expect("state dir");
    let workspace_dir = tempfile::tempdir().expect("workspace dir");
    let blob_dir = tempfile::tempdir().expect("blob dir");

    let clock = FakeClock::new();
    let store = Arc::new(Store::open(state_dir.path()).expect("store"));
    let control = Arc::new(Control::new(store, clock.clone(), queue));
    let api = Arc::new(LocalControlApi::new(control.clone()));

    let executor = Arc::new(FakeExecutor::new());
    let launcher = Arc::new(FakeLauncher::new());
    let blob = Arc::new(FsBlobStore::new(blob_dir.path()));
    let workspace =
        Arc::new(WorkspaceManager::new(workspace_dir.path(), true, true).expect("workspace"));
    let pool = Arc::new(ContainerPool::new(launcher.clone(), 8));

    let settings = Settings::default().worker_id(WORKER).max_concurrent_tasks(4);
    let puller = Arc::new(RunPuller::new(
        api.clone(),
        executor.clone(),
        pool.clone(),
        blob.clone(),
        workspace.clone(),
        settings,
        clock.clone(),
    ));
    let relay = Arc::new(CallbackRelay::new(
        api.clone(),
        executor.clone(),
        pool.clone(),
        workspace.clone(),
        Arc::new(WorkspaceExporter::new(blob.clone(), clock.clone())),
        Duration::from_millis(200),
    ));

    Deployment {
        control,
        clock,
        api,
        executor,
        launcher,
        blob,
        workspace,
        pool,
        puller,
        relay,
        _dirs: (state_dir, workspace_dir, blob_dir),
    }
}

impl Deployment {
    pub fn ctx(&self, user: &str) -> RequestCtx {
        RequestCtx::new(user)
    }

    pub fn enqueue(&self, user: &str, prompt: &str) -> relay_wire::TaskEnqueueOutcome {
        self.control
            .enqueue_task(
                &self.ctx(user),
                TaskEnqueueRequest { prompt: prompt.to_string(), ..Default::default() },
            )
            .expect("enqueue")
    }

    pub fn claim(&self, worker: &str, lease_seconds: u32) -> Option<RunClaimGrant> {
        self.control
            .claim_run(
                &self.ctx("worker"),
                RunClaimRequest {
                    worker_id: worker.to_string(),
                    lease_seconds,
                    schedule_modes: None,
                },
            )
            .expect("claim")
    }

    pub fn session(&self, id: &SessionId) -> relay_core::Session {
        self.control.store().read(|state| state.sessions[id].clone())
    }

    pub fn run(&self, id: &RunId) -> relay_core::Run {
        self.control.store().read(|state| state.runs[id].clone())
    }
}
