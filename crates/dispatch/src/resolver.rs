// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config resolution: turn a claimed run's opaque snapshot into the
//! fully-materialized config the executor consumes.

use crate::api::ControlApi;
use crate::error::DispatchError;
use relay_core::config::keys;
use relay_core::ConfigSnapshot;
use relay_wire::{SubAgentDefinition, SkillFileSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// One skill as staged for the executor. `local_path` is filled by the
/// skill stager after download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedSkill {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
    #[serde(default)]
    pub is_prefix: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl From<SkillFileSpec> for StagedSkill {
    fn from(spec: SkillFileSpec) -> Self {
        Self { enabled: spec.enabled, s3_key: spec.s3_key, is_prefix: spec.is_prefix, local_path: None }
    }
}

/// The effective execution config handed to the executor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Decrypted env map (system ∪ user, user shadows system).
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Merged `mcpServers` mapping for the selected servers.
    #[serde(default)]
    pub mcp_servers: Map<String, Value>,
    #[serde(default)]
    pub skill_files: BTreeMap<String, StagedSkill>,
    #[serde(default)]
    pub structured_agents: BTreeMap<String, SubAgentDefinition>,
    #[serde(default)]
    pub raw_agents: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_token_env_key: Option<String>,
    #[serde(default)]
    pub browser_enabled: bool,
    #[serde(default)]
    pub container_mode: String,
    /// Per-run attachments (staged under `workspace/inputs/`).
    #[serde(default)]
    pub input_files: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Resolves a snapshot into a [`ResolvedConfig`] via the control plane's
/// internal surface, scoped to the run's user.
pub struct ConfigResolver {
    api: Arc<dyn ControlApi>,
    default_model: Option<String>,
}

impl ConfigResolver {
    pub fn new(api: Arc<dyn ControlApi>, default_model: Option<String>) -> Self {
        Self { api, default_model: default_model.filter(|m| !m.is_empty()) }
    }

    pub async fn resolve(
        &self,
        user_id: &str,
        snapshot: &ConfigSnapshot,
    ) -> Result<ResolvedConfig, DispatchError> {
        let env = self.api.env_map(user_id).await?;

        let mcp_server_ids = snapshot.id_list(keys::MCP_SERVER_IDS).unwrap_or_default();
        let mcp_servers = if mcp_server_ids.is_empty() {
            Map::new()
        } else {
            self.api.resolve_mcp_config(user_id, mcp_server_ids).await?
        };

        let skill_ids = snapshot.id_list(keys::SKILL_IDS).unwrap_or_default();
        let skill_files: BTreeMap<String, StagedSkill> = if skill_ids.is_empty() {
            BTreeMap::new()
        } else {
            self.api
                .resolve_skill_config(user_id, skill_ids)
                .await?
                .into_iter()
                .map(|(name, spec)| (name, StagedSkill::from(spec)))
                .collect()
        };

        let subagents = self
            .api
            .resolve_subagents(user_id, snapshot.id_list(keys::SUBAGENT_IDS))
            .await?;

        let input_files = snapshot
            .get(keys::INPUT_FILES)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(ResolvedConfig {
            env,
            mcp_servers,
            skill_files,
            structured_agents: subagents.structured_agents,
            raw_agents: subagents.raw_agents,
            repo_url: snapshot.str_field(keys::REPO_URL).map(String::from),
            git_branch: snapshot.str_field(keys::GIT_BRANCH).map(String::from),
            git_token_env_key: snapshot.str_field(keys::GIT_TOKEN_ENV_KEY).map(String::from),
            browser_enabled: snapshot.bool_field(keys::BROWSER_ENABLED),
            container_mode: snapshot.container_mode().to_string(),
            input_files,
            default_model: self.default_model.clone(),
        })
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
