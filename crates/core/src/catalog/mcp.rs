// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MCP server catalog records and per-user installations.

use super::Scope;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for an MCP server record.
    pub struct McpServerId("mcp-");
}

/// A registered MCP server. `server_config` holds the raw
/// `{"mcpServers": {...}}` object and is treated as sensitive: it is
/// stripped from every snapshot and resolved only at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServer {
    pub id: McpServerId,
    pub name: String,
    pub scope: Scope,
    pub owner_user_id: String,
    pub server_config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl McpServer {
    /// The `mcpServers` mapping inside the stored config, if well-formed.
    pub fn mcp_servers(&self) -> Option<&serde_json::Map<String, Value>> {
        self.server_config.get("mcpServers").and_then(Value::as_object)
    }
}

/// Link between a user and an MCP server. Idempotent upsert; `enabled`
/// is the default toggle state for new runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMcpInstall {
    pub user_id: String,
    pub server_id: McpServerId,
    pub enabled: bool,
    pub created_at_ms: u64,
}

crate::builder! {
    pub struct McpServerBuilder => McpServer {
        into {
            id: McpServerId = "mcp-test",
            name: String = "github",
            owner_user_id: String = "u1",
        }
        set {
            scope: Scope = Scope::User,
            server_config: Value = serde_json::json!({"mcpServers": {}}),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            description: String = None,
        }
    }
}
