// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-wire: transport-neutral DTOs for the control plane and
//! dispatcher surfaces.
//!
//! Every response shares the `{code, message, data}` envelope; `code = 0`
//! is success. The HTTP layer is an external collaborator, these shapes
//! are the contract it serializes.

mod error;
mod request;
mod response;
mod types;

pub use error::ErrorKind;
pub use request::{
    CancelRequest, EnvVarCreateRequest, EnvVarUpdateRequest, InputRequestAnswerRequest,
    InputRequestCreateRequest, InstallRequest, InstructionsSetRequest, McpConfigResolveRequest,
    McpServerCreateRequest, McpServerUpdateRequest, PluginCreateRequest, ProjectCreateRequest,
    ProjectUpdateRequest, RunClaimRequest, RunFailRequest, RunStartRequest,
    ScheduledTaskCreateRequest, ScheduledTaskUpdateRequest, SessionCreateRequest,
    SessionListQuery, SessionUpdateRequest, SkillConfigResolveRequest, SkillCreateRequest,
    SkillUpdateRequest, SlashCommandCreateRequest, SlashCommandResolveRequest,
    SlashCommandUpdateRequest, SubAgentCreateRequest, SubAgentResolveRequest,
    SubAgentUpdateRequest, SystemEnvVarCreateRequest, SystemEnvVarUpdateRequest,
    TaskEnqueueRequest,
};
pub use response::Envelope;
pub use types::{
    CallbackAck, CancelOutcome, EnvVarPublicView, InputRequestView, InstallView,
    InstructionsView, McpServerView, MessageView, PluginView, ProjectView, RunClaimGrant,
    RunView, ScheduledTaskView, SessionStateView, SessionView, SkillFileSpec, SkillView,
    SlashCommandView, SubAgentDefinition, SubAgentResolution, SubAgentView,
    SystemEnvVarView, TaskEnqueueOutcome, ToolExecutionView, UsageLogView,
};

#[cfg(test)]
mod property_tests;
