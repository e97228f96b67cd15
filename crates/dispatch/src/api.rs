// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher's view of the control plane.
//!
//! Deployments bind this to an HTTP client carrying `X-Internal-Token`
//! and the tracing headers; tests bind it in-process.

use async_trait::async_trait;
use relay_core::{Callback, RunId};
use relay_wire::{
    CallbackAck, InstructionsView, RunClaimGrant, RunClaimRequest, RunFailRequest,
    RunStartRequest, SkillFileSpec, SubAgentResolution,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: the control plane could not be reached.
    #[error("control plane unavailable: {0}")]
    Unavailable(String),
    /// The control plane answered with a non-zero envelope code.
    #[error("control plane rejected request ({code}): {message}")]
    Rejected { code: u32, message: String },
}

/// Control-plane operations the dispatcher consumes.
#[async_trait]
pub trait ControlApi: Send + Sync {
    async fn claim_run(
        &self,
        request: RunClaimRequest,
    ) -> Result<Option<RunClaimGrant>, ApiError>;

    async fn start_run(&self, run_id: &RunId, request: RunStartRequest) -> Result<(), ApiError>;

    async fn fail_run(&self, run_id: &RunId, request: RunFailRequest) -> Result<(), ApiError>;

    async fn forward_callback(&self, callback: Callback) -> Result<CallbackAck, ApiError>;

    async fn env_map(&self, user_id: &str) -> Result<HashMap<String, String>, ApiError>;

    async fn resolve_mcp_config(
        &self,
        user_id: &str,
        server_ids: Vec<String>,
    ) -> Result<Map<String, Value>, ApiError>;

    async fn resolve_skill_config(
        &self,
        user_id: &str,
        skill_ids: Vec<String>,
    ) -> Result<BTreeMap<String, SkillFileSpec>, ApiError>;

    async fn resolve_subagents(
        &self,
        user_id: &str,
        subagent_ids: Option<Vec<String>>,
    ) -> Result<SubAgentResolution, ApiError>;

    async fn resolve_slash_commands(
        &self,
        user_id: &str,
        names: Vec<String>,
    ) -> Result<BTreeMap<String, String>, ApiError>;

    async fn user_instructions(&self, user_id: &str) -> Result<InstructionsView, ApiError>;
}
