// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability catalogs: per-user and system-scoped records the resolver
//! consults when materializing a run's effective configuration.
//!
//! Visibility rule: a user-scoped record shadows a system-scoped record
//! with the same name.

mod env_var;
mod instructions;
mod mcp;
mod plugin;
mod project;
mod scheduled_task;
mod skill;
mod slash_command;
mod subagent;

pub use env_var::{EnvVar, EnvVarId};
pub use instructions::UserInstructions;
pub use mcp::{McpServer, McpServerId, UserMcpInstall};
pub use plugin::{Plugin, PluginId, UserPluginInstall};
pub use project::{Project, ProjectId};
pub use scheduled_task::{ScheduledTask, ScheduledTaskId};
pub use skill::{SkillId, SkillRecord, UserSkillInstall};
pub use slash_command::{SlashCommand, SlashCommandId, SlashCommandMode};
pub use subagent::{
    normalize_tools, SubAgent, SubAgentId, SubAgentMode, ALLOWED_SUBAGENT_MODELS,
    MAX_SUBAGENT_TOOLS,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved owner id for system-scoped records.
pub const SYSTEM_USER_ID: &str = "__system__";

/// Record scope. System records are visible to everyone unless shadowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    User,
    System,
}

crate::simple_display! {
    Scope {
        User => "user",
        System => "system",
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("invalid name: {0:?}")]
    InvalidName(String),
}

/// Validate a name used as a filesystem path component (skill, plugin,
/// sub-agent, slash command). Rejects traversal and anything outside
/// `[A-Za-z0-9._-]`.
pub fn validate_component_name(name: &str) -> Result<&str, CatalogError> {
    let value = name.trim();
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(value)
    } else {
        Err(CatalogError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
