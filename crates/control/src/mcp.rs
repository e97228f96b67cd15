// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MCP server catalog, per-user installs, and the effective-config
//! resolver used at dispatch time.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{
    validate_component_name, Clock, Event, McpServer, McpServerId, Scope, UserMcpInstall,
};
use relay_storage::{install_key, MaterializedState};
use relay_wire::{
    InstallView, McpConfigResolveRequest, McpServerCreateRequest, McpServerUpdateRequest,
    McpServerView,
};
use serde_json::{Map, Value};
use std::collections::HashSet;

impl<C: Clock> Control<C> {
    /// Servers visible to the user: their own plus unshadowed system ones.
    pub fn list_mcp_servers(&self, ctx: &RequestCtx) -> Result<Vec<McpServerView>, ControlError> {
        Ok(self.store.read(|state| {
            visible_servers(state, &ctx.user_id).into_iter().map(McpServerView::from).collect()
        }))
    }

    pub fn create_mcp_server(
        &self,
        ctx: &RequestCtx,
        request: McpServerCreateRequest,
    ) -> Result<McpServerView, ControlError> {
        let name = validate_component_name(&request.name)
            .map_err(|e| ControlError::bad_request(e.to_string()))?
            .to_string();
        let scope = request.scope.unwrap_or(Scope::User);
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            // At most one system record per name, and one user record per
            // (name, owner): the shadowing rule depends on it.
            let taken = state.mcp_servers.values().any(|s| {
                s.name == name
                    && match scope {
                        Scope::System => s.scope == Scope::System,
                        Scope::User => s.scope == Scope::User && s.owner_user_id == ctx.user_id,
                    }
            });
            if taken {
                return Err(ControlError::conflict(format!("MCP server already exists: {name}")));
            }
            let server = McpServer {
                id: McpServerId::new(),
                name: name.clone(),
                scope,
                owner_user_id: ctx.user_id.clone(),
                server_config: request.server_config.clone(),
                description: request.description.clone(),
                created_at_ms: now,
                updated_at_ms: now,
            };
            let view = McpServerView::from(&server);
            Ok((vec![Event::McpServerUpserted { server }], view))
        })
    }

    pub fn update_mcp_server(
        &self,
        ctx: &RequestCtx,
        server_id: &McpServerId,
        request: McpServerUpdateRequest,
    ) -> Result<McpServerView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let mut server = owned_server(state, &ctx.user_id, server_id)?;
            if let Some(name) = &request.name {
                let name = validate_component_name(name)
                    .map_err(|e| ControlError::bad_request(e.to_string()))?;
                let taken = state.mcp_servers.values().any(|s| {
                    s.id != server.id
                        && s.name == name
                        && s.scope == server.scope
                        && s.owner_user_id == server.owner_user_id
                });
                if taken {
                    return Err(ControlError::conflict(format!(
                        "MCP server already exists: {name}"
                    )));
                }
                server.name = name.to_string();
            }
            if let Some(config) = &request.server_config {
                server.server_config = config.clone();
            }
            if let Some(description) = &request.description {
                server.description = Some(description.clone());
            }
            server.updated_at_ms = now;
            let view = McpServerView::from(&server);
            Ok((vec![Event::McpServerUpserted { server }], view))
        })
    }

    pub fn delete_mcp_server(
        &self,
        ctx: &RequestCtx,
        server_id: &McpServerId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let server = owned_server(state, &ctx.user_id, server_id)?;
            Ok((vec![Event::McpServerDeleted { id: server.id }], ()))
        })
    }

    /// Idempotent install upsert; re-installing after a delete resurrects
    /// the link with the new enabled flag.
    pub fn install_mcp_server(
        &self,
        ctx: &RequestCtx,
        server_id: &McpServerId,
        enabled: bool,
    ) -> Result<InstallView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let visible = state.mcp_servers.get(server_id).is_some_and(|s| {
                s.scope == Scope::System || s.owner_user_id == ctx.user_id
            });
            if !visible {
                return Err(ControlError::not_found(format!(
                    "MCP server not found: {server_id}"
                )));
            }
            let created_at_ms = state
                .mcp_installs
                .get(&install_key(&ctx.user_id, server_id.as_str()))
                .map(|i| i.created_at_ms)
                .unwrap_or(now);
            let install = UserMcpInstall {
                user_id: ctx.user_id.clone(),
                server_id: *server_id,
                enabled,
                created_at_ms,
            };
            let view = InstallView {
                user_id: install.user_id.clone(),
                capability_id: install.server_id.to_string(),
                enabled,
                created_at_ms,
            };
            Ok((vec![Event::McpInstallUpserted { install }], view))
        })
    }

    pub fn uninstall_mcp_server(
        &self,
        ctx: &RequestCtx,
        server_id: &McpServerId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            if !state.mcp_installs.contains_key(&install_key(&ctx.user_id, server_id.as_str())) {
                return Err(ControlError::not_found(format!(
                    "MCP install not found: {server_id}"
                )));
            }
            Ok((
                vec![Event::McpInstallDeleted {
                    user_id: ctx.user_id.clone(),
                    server_id: *server_id,
                }],
                (),
            ))
        })
    }

    pub fn list_mcp_installs(&self, ctx: &RequestCtx) -> Result<Vec<InstallView>, ControlError> {
        Ok(self.store.read(|state| {
            let mut installs: Vec<&UserMcpInstall> =
                state.mcp_installs.values().filter(|i| i.user_id == ctx.user_id).collect();
            installs.sort_by_key(|i| (i.created_at_ms, i.server_id));
            installs
                .into_iter()
                .map(|i| InstallView {
                    user_id: i.user_id.clone(),
                    capability_id: i.server_id.to_string(),
                    enabled: i.enabled,
                    created_at_ms: i.created_at_ms,
                })
                .collect()
        }))
    }

    /// Merge the `mcpServers` objects of the selected servers into one
    /// mapping, preserving caller order (later entries win on duplicate
    /// names). Unknown or uninstalled ids are skipped silently; they may
    /// have been deleted since enqueue.
    pub fn resolve_mcp_config(
        &self,
        ctx: &RequestCtx,
        request: McpConfigResolveRequest,
    ) -> Result<Map<String, Value>, ControlError> {
        if request.server_ids.is_empty() {
            return Ok(Map::new());
        }
        Ok(self.store.read(|state| {
            let installed: HashSet<&str> = state
                .mcp_installs
                .values()
                .filter(|i| i.user_id == ctx.user_id)
                .map(|i| i.server_id.as_str())
                .collect();

            let mut seen = HashSet::new();
            let mut resolved = Map::new();
            for raw_id in &request.server_ids {
                let id = raw_id.trim();
                if id.is_empty() || !seen.insert(id) {
                    continue;
                }
                if !installed.contains(id) {
                    continue;
                }
                let Some(server) = state.mcp_servers.get(&McpServerId::from_string(id)) else {
                    continue;
                };
                let Some(servers) = server.mcp_servers() else {
                    continue;
                };
                for (name, config) in servers {
                    resolved.insert(name.clone(), config.clone());
                }
            }
            resolved
        }))
    }
}

fn visible_servers<'a>(state: &'a MaterializedState, user_id: &str) -> Vec<&'a McpServer> {
    let user_names: HashSet<&str> = state
        .mcp_servers
        .values()
        .filter(|s| s.scope == Scope::User && s.owner_user_id == user_id)
        .map(|s| s.name.as_str())
        .collect();

    let mut servers: Vec<&McpServer> = state
        .mcp_servers
        .values()
        .filter(|s| {
            (s.scope == Scope::User && s.owner_user_id == user_id)
                || (s.scope == Scope::System && !user_names.contains(s.name.as_str()))
        })
        .collect();
    servers.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(a.name.cmp(&b.name)));
    servers
}

fn owned_server(
    state: &MaterializedState,
    user_id: &str,
    server_id: &McpServerId,
) -> Result<McpServer, ControlError> {
    match state.mcp_servers.get(server_id) {
        Some(server) if server.owner_user_id == user_id && server.scope == Scope::User => {
            Ok(server.clone())
        }
        _ => Err(ControlError::not_found(format!("MCP server not found: {server_id}"))),
    }
}

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod tests;
