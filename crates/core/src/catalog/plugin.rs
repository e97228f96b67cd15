// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin catalog records and per-user installations.
//!
//! Plugins are archive-imported bundles (`.claude-plugin/plugin.json`);
//! import ingestion itself is an external collaborator, the catalog only
//! stores the records.

use super::Scope;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a plugin record.
    pub struct PluginId("plg-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: PluginId,
    pub name: String,
    pub scope: Scope,
    pub owner_user_id: String,
    /// Parsed `plugin.json` manifest.
    #[serde(default)]
    pub manifest: Value,
    /// Asset location, same shape as skill entries.
    #[serde(default)]
    pub entry: Value,
    #[serde(default)]
    pub source: Value,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

/// Link between a user and a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPluginInstall {
    pub user_id: String,
    pub plugin_id: PluginId,
    pub enabled: bool,
    pub created_at_ms: u64,
}

crate::builder! {
    pub struct PluginBuilder => Plugin {
        into {
            id: PluginId = "plg-test",
            name: String = "linter",
            owner_user_id: String = "u1",
        }
        set {
            scope: Scope = Scope::User,
            manifest: Value = serde_json::json!({"name": "linter"}),
            entry: Value = serde_json::json!({}),
            source: Value = serde_json::json!({"kind": "zip"}),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
    }
}
