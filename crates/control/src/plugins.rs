// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin catalog and per-user installs. Archive import ingestion is an
//! external collaborator; records arrive through this CRUD surface.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{validate_component_name, Clock, Event, Plugin, PluginId, Scope, UserPluginInstall};
use relay_storage::{install_key, MaterializedState};
use relay_wire::{InstallView, PluginCreateRequest, PluginView};
use std::collections::HashSet;

impl<C: Clock> Control<C> {
    pub fn list_plugins(&self, ctx: &RequestCtx) -> Result<Vec<PluginView>, ControlError> {
        Ok(self.store.read(|state| {
            visible_plugins(state, &ctx.user_id).into_iter().map(PluginView::from).collect()
        }))
    }

    pub fn create_plugin(
        &self,
        ctx: &RequestCtx,
        request: PluginCreateRequest,
    ) -> Result<PluginView, ControlError> {
        let name = validate_component_name(&request.name)
            .map_err(|e| ControlError::bad_request(e.to_string()))?
            .to_string();
        let scope = request.scope.unwrap_or(Scope::User);
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            let taken = state.plugins.values().any(|p| {
                p.name == name
                    && match scope {
                        Scope::System => p.scope == Scope::System,
                        Scope::User => p.scope == Scope::User && p.owner_user_id == ctx.user_id,
                    }
            });
            if taken {
                return Err(ControlError::conflict(format!("Plugin already exists: {name}")));
            }
            let plugin = Plugin {
                id: PluginId::new(),
                name: name.clone(),
                scope,
                owner_user_id: ctx.user_id.clone(),
                manifest: request.manifest.clone(),
                entry: request.entry.clone(),
                source: serde_json::json!({"kind": "manual"}),
                created_at_ms: now,
                updated_at_ms: now,
            };
            let view = PluginView::from(&plugin);
            Ok((vec![Event::PluginUpserted { plugin }], view))
        })
    }

    pub fn delete_plugin(
        &self,
        ctx: &RequestCtx,
        plugin_id: &PluginId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            match state.plugins.get(plugin_id) {
                Some(plugin) if plugin.scope == Scope::System => {
                    Err(ControlError::forbidden("Plugin modification forbidden"))
                }
                Some(plugin) if plugin.owner_user_id == ctx.user_id => {
                    Ok((vec![Event::PluginDeleted { id: plugin.id }], ()))
                }
                _ => Err(ControlError::not_found(format!("Plugin not found: {plugin_id}"))),
            }
        })
    }

    pub fn install_plugin(
        &self,
        ctx: &RequestCtx,
        plugin_id: &PluginId,
        enabled: bool,
    ) -> Result<InstallView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let visible = state
                .plugins
                .get(plugin_id)
                .is_some_and(|p| p.scope == Scope::System || p.owner_user_id == ctx.user_id);
            if !visible {
                return Err(ControlError::not_found(format!("Plugin not found: {plugin_id}")));
            }
            let created_at_ms = state
                .plugin_installs
                .get(&install_key(&ctx.user_id, plugin_id.as_str()))
                .map(|i| i.created_at_ms)
                .unwrap_or(now);
            let install = UserPluginInstall {
                user_id: ctx.user_id.clone(),
                plugin_id: *plugin_id,
                enabled,
                created_at_ms,
            };
            let view = InstallView {
                user_id: install.user_id.clone(),
                capability_id: install.plugin_id.to_string(),
                enabled,
                created_at_ms,
            };
            Ok((vec![Event::PluginInstallUpserted { install }], view))
        })
    }

    pub fn uninstall_plugin(
        &self,
        ctx: &RequestCtx,
        plugin_id: &PluginId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            if !state.plugin_installs.contains_key(&install_key(&ctx.user_id, plugin_id.as_str()))
            {
                return Err(ControlError::not_found(format!(
                    "Plugin install not found: {plugin_id}"
                )));
            }
            Ok((
                vec![Event::PluginInstallDeleted {
                    user_id: ctx.user_id.clone(),
                    plugin_id: *plugin_id,
                }],
                (),
            ))
        })
    }

    pub fn list_plugin_installs(
        &self,
        ctx: &RequestCtx,
    ) -> Result<Vec<InstallView>, ControlError> {
        Ok(self.store.read(|state| {
            let mut installs: Vec<&UserPluginInstall> =
                state.plugin_installs.values().filter(|i| i.user_id == ctx.user_id).collect();
            installs.sort_by_key(|i| (i.created_at_ms, i.plugin_id));
            installs
                .into_iter()
                .map(|i| InstallView {
                    user_id: i.user_id.clone(),
                    capability_id: i.plugin_id.to_string(),
                    enabled: i.enabled,
                    created_at_ms: i.created_at_ms,
                })
                .collect()
        }))
    }
}

fn visible_plugins<'a>(state: &'a MaterializedState, user_id: &str) -> Vec<&'a Plugin> {
    let user_names: HashSet<&str> = state
        .plugins
        .values()
        .filter(|p| p.scope == Scope::User && p.owner_user_id == user_id)
        .map(|p| p.name.as_str())
        .collect();

    let mut plugins: Vec<&Plugin> = state
        .plugins
        .values()
        .filter(|p| {
            (p.scope == Scope::User && p.owner_user_id == user_id)
                || (p.scope == Scope::System && !user_names.contains(p.name.as_str()))
        })
        .collect();
    plugins.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(a.name.cmp(&b.name)));
    plugins
}
