// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config snapshots and the enqueue-time merge.
//!
//! A snapshot is an open map on the wire but the merge itself is a pure
//! function: explicit null removes a key, nested objects shallow-merge,
//! everything else replaces. Unknown keys are preserved but never acted
//! upon. `TaskConfig` is the closed view of the keys the system acts on,
//! with tri-state fields so "explicitly set to null" is distinguishable
//! from "not provided".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Well-known snapshot keys.
pub mod keys {
    pub const REPO_URL: &str = "repo_url";
    pub const GIT_BRANCH: &str = "git_branch";
    pub const GIT_TOKEN_ENV_KEY: &str = "git_token_env_key";
    pub const CONTAINER_MODE: &str = "container_mode";
    pub const CONTAINER_ID: &str = "container_id";
    pub const BROWSER_ENABLED: &str = "browser_enabled";
    pub const MCP_CONFIG: &str = "mcp_config";
    pub const SKILL_CONFIG: &str = "skill_config";
    pub const MCP_SERVER_IDS: &str = "mcp_server_ids";
    pub const SKILL_IDS: &str = "skill_ids";
    pub const SUBAGENT_IDS: &str = "subagent_ids";
    pub const INPUT_FILES: &str = "input_files";
    /// Legacy key, dropped from bases during merge.
    pub const SKILL_FILES: &str = "skill_files";
}

/// Tri-state patch field: distinguishes "not provided" from an explicit
/// null (which removes the key) and a concrete value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Missing,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            // Missing fields are skipped via skip_serializing_if; a bare
            // Missing serializes as null for robustness.
            Patch::Missing | Patch::Null => serializer.serialize_none(),
            Patch::Value(v) => v.serialize(serializer),
        }
    }
}

/// The persisted config bag for a session or run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSnapshot(pub Map<String, Value>);

impl ConfigSnapshot {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn bool_field(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn id_list(&self, key: &str) -> Option<Vec<String>> {
        self.0.get(key).and_then(normalize_id_list)
    }

    /// Container mode, defaulting to ephemeral.
    pub fn container_mode(&self) -> &str {
        self.str_field(keys::CONTAINER_MODE).unwrap_or("ephemeral")
    }

    /// Copy with full MCP configs removed. Snapshots handed to callers or
    /// workers never carry raw server configs.
    pub fn sanitized(&self) -> ConfigSnapshot {
        let mut map = self.0.clone();
        map.remove(keys::MCP_CONFIG);
        ConfigSnapshot(map)
    }
}

impl From<Map<String, Value>> for ConfigSnapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Merge `overrides` into `defaults`: null removes, objects shallow-merge,
/// anything else replaces.
pub fn merge_config_map(defaults: &Map<String, Value>, overrides: Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        match value {
            Value::Null => {
                merged.remove(&key);
            }
            Value::Object(patch) => match merged.get_mut(&key) {
                Some(Value::Object(existing)) => {
                    for (k, v) in patch {
                        existing.insert(k, v);
                    }
                }
                _ => {
                    merged.insert(key, Value::Object(patch));
                }
            },
            other => {
                merged.insert(key, other);
            }
        }
    }
    merged
}

/// Normalize an id-list value: strings are trimmed (empties skipped),
/// numbers stringified, anything else skipped. Non-lists yield None.
pub fn normalize_id_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    result.push(trimmed.to_string());
                }
            }
            Value::Number(n) => result.push(n.to_string()),
            _ => {}
        }
    }
    Some(result)
}

/// The caller-provided task configuration. Only explicitly-set fields
/// participate in the merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub repo_url: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub git_branch: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub git_token_env_key: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub container_mode: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub container_id: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub browser_enabled: Patch<bool>,
    /// MCP server enable/disable toggles keyed by server id. Extracted
    /// before the map merge, never merged as a dict.
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub mcp_config: Patch<BTreeMap<String, bool>>,
    /// Skill toggles, same contract as `mcp_config`.
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub skill_config: Patch<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub mcp_server_ids: Patch<Vec<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub skill_ids: Patch<Vec<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub subagent_ids: Patch<Vec<String>>,
    /// Per-run attachments; never merged into the session snapshot.
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub input_files: Patch<Vec<Value>>,
    /// Unknown keys, preserved through merges but never acted upon.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskConfig {
    /// The override map fed to [`merge_config_map`]. Toggle maps and
    /// input files are excluded; they are handled out of band.
    pub fn overrides(&self) -> Map<String, Value> {
        let mut map = Map::new();
        patch_entry(&mut map, keys::REPO_URL, &self.repo_url);
        patch_entry(&mut map, keys::GIT_BRANCH, &self.git_branch);
        patch_entry(&mut map, keys::GIT_TOKEN_ENV_KEY, &self.git_token_env_key);
        patch_entry(&mut map, keys::CONTAINER_MODE, &self.container_mode);
        patch_entry(&mut map, keys::CONTAINER_ID, &self.container_id);
        patch_entry(&mut map, keys::BROWSER_ENABLED, &self.browser_enabled);
        patch_entry(&mut map, keys::MCP_SERVER_IDS, &self.mcp_server_ids);
        patch_entry(&mut map, keys::SKILL_IDS, &self.skill_ids);
        patch_entry(&mut map, keys::SUBAGENT_IDS, &self.subagent_ids);
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    pub fn mcp_toggles(&self) -> Option<&BTreeMap<String, bool>> {
        self.mcp_config.value()
    }

    pub fn skill_toggles(&self) -> Option<&BTreeMap<String, bool>> {
        self.skill_config.value()
    }

    pub fn input_files(&self) -> Option<&Vec<Value>> {
        self.input_files.value()
    }
}

fn patch_entry<T: Serialize>(map: &mut Map<String, Value>, key: &str, patch: &Patch<T>) {
    match patch {
        Patch::Missing => {}
        Patch::Null => {
            map.insert(key.to_string(), Value::Null);
        }
        Patch::Value(v) => {
            if let Ok(value) = serde_json::to_value(v) {
                map.insert(key.to_string(), value);
            }
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
