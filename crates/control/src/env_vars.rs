// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable catalog.
//!
//! Public surfaces never carry values, only `is_set`. The internal env
//! map merges system and user scopes with the user shadowing the system;
//! empty values are excluded so missing secrets fail loudly downstream.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{Clock, EnvVar, EnvVarId, Event, Scope, SYSTEM_USER_ID};
use relay_wire::{
    EnvVarCreateRequest, EnvVarPublicView, EnvVarUpdateRequest, SystemEnvVarCreateRequest,
    SystemEnvVarUpdateRequest, SystemEnvVarView,
};
use std::collections::HashMap;

impl<C: Clock> Control<C> {
    pub fn list_public_env_vars(
        &self,
        ctx: &RequestCtx,
    ) -> Result<Vec<EnvVarPublicView>, ControlError> {
        require_regular_user(&ctx.user_id)?;
        Ok(self.store.read(|state| {
            let mut items: Vec<EnvVarPublicView> = Vec::new();
            items.extend(
                sorted_vars(state, SYSTEM_USER_ID, Scope::System).into_iter().map(EnvVarPublicView::from),
            );
            items.extend(
                sorted_vars(state, &ctx.user_id, Scope::User).into_iter().map(EnvVarPublicView::from),
            );
            items
        }))
    }

    pub fn create_user_env_var(
        &self,
        ctx: &RequestCtx,
        request: EnvVarCreateRequest,
    ) -> Result<EnvVarPublicView, ControlError> {
        require_regular_user(&ctx.user_id)?;
        let key = normalize_key(&request.key)?;
        let value = normalize_user_value(&request.value)?;
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            if find_by_key(state, &ctx.user_id, &key).is_some() {
                return Err(ControlError::conflict(format!("Env var already exists: {key}")));
            }
            let var = EnvVar {
                id: EnvVarId::new(),
                user_id: ctx.user_id.clone(),
                key,
                value,
                description: request.description.clone(),
                scope: Scope::User,
                created_at_ms: now,
                updated_at_ms: now,
            };
            let view = EnvVarPublicView::from(&var);
            Ok((vec![Event::EnvVarUpserted { var }], view))
        })
    }

    pub fn update_user_env_var(
        &self,
        ctx: &RequestCtx,
        env_var_id: &EnvVarId,
        request: EnvVarUpdateRequest,
    ) -> Result<EnvVarPublicView, ControlError> {
        require_regular_user(&ctx.user_id)?;
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let mut var = owned_user_var(state, &ctx.user_id, env_var_id)?;
            if let Some(value) = &request.value {
                var.value = normalize_user_value(value)?;
            }
            if let Some(description) = &request.description {
                var.description = Some(description.clone());
            }
            var.updated_at_ms = now;
            let view = EnvVarPublicView::from(&var);
            Ok((vec![Event::EnvVarUpserted { var }], view))
        })
    }

    pub fn delete_user_env_var(
        &self,
        ctx: &RequestCtx,
        env_var_id: &EnvVarId,
    ) -> Result<(), ControlError> {
        require_regular_user(&ctx.user_id)?;
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let var = owned_user_var(state, &ctx.user_id, env_var_id)?;
            Ok((vec![Event::EnvVarDeleted { id: var.id }], ()))
        })
    }

    /// The decrypted env map for config resolution: system ∪ user, user
    /// shadowing system, unset values excluded.
    pub fn env_map(&self, ctx: &RequestCtx) -> Result<HashMap<String, String>, ControlError> {
        Ok(self.store.read(|state| {
            let mut map = HashMap::new();
            for var in sorted_vars(state, SYSTEM_USER_ID, Scope::System) {
                if var.is_set() {
                    map.insert(var.key.clone(), var.value.clone());
                }
            }
            for var in sorted_vars(state, &ctx.user_id, Scope::User) {
                if var.is_set() {
                    map.insert(var.key.clone(), var.value.clone());
                }
            }
            map
        }))
    }

    pub fn list_system_env_vars(&self) -> Result<Vec<SystemEnvVarView>, ControlError> {
        Ok(self.store.read(|state| {
            sorted_vars(state, SYSTEM_USER_ID, Scope::System)
                .into_iter()
                .map(SystemEnvVarView::from)
                .collect()
        }))
    }

    pub fn create_system_env_var(
        &self,
        request: SystemEnvVarCreateRequest,
    ) -> Result<SystemEnvVarView, ControlError> {
        let key = normalize_key(&request.key)?;
        // System vars can be empty: declared-but-unset.
        let value = request.value.trim().to_string();
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            if find_by_key(state, SYSTEM_USER_ID, &key).is_some() {
                return Err(ControlError::conflict(format!(
                    "System env var already exists: {key}"
                )));
            }
            let var = EnvVar {
                id: EnvVarId::new(),
                user_id: SYSTEM_USER_ID.to_string(),
                key,
                value,
                description: request.description.clone(),
                scope: Scope::System,
                created_at_ms: now,
                updated_at_ms: now,
            };
            let view = SystemEnvVarView::from(&var);
            Ok((vec![Event::EnvVarUpserted { var }], view))
        })
    }

    pub fn update_system_env_var(
        &self,
        env_var_id: &EnvVarId,
        request: SystemEnvVarUpdateRequest,
    ) -> Result<SystemEnvVarView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let mut var = system_var(state, env_var_id)?;
            if let Some(value) = &request.value {
                var.value = value.trim().to_string();
            }
            if let Some(description) = &request.description {
                var.description = Some(description.clone());
            }
            var.updated_at_ms = now;
            let view = SystemEnvVarView::from(&var);
            Ok((vec![Event::EnvVarUpserted { var }], view))
        })
    }

    pub fn delete_system_env_var(&self, env_var_id: &EnvVarId) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let var = system_var(state, env_var_id)?;
            Ok((vec![Event::EnvVarDeleted { id: var.id }], ()))
        })
    }
}

fn require_regular_user(user_id: &str) -> Result<(), ControlError> {
    if user_id == SYSTEM_USER_ID {
        return Err(ControlError::forbidden("Reserved user id"));
    }
    Ok(())
}

fn normalize_key(key: &str) -> Result<String, ControlError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ControlError::bad_request("Env var key cannot be empty"));
    }
    Ok(key.to_string())
}

fn normalize_user_value(value: &str) -> Result<String, ControlError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ControlError::bad_request("Env var value cannot be empty"));
    }
    Ok(value.to_string())
}

fn sorted_vars<'a>(
    state: &'a relay_storage::MaterializedState,
    user_id: &str,
    scope: Scope,
) -> Vec<&'a EnvVar> {
    let mut vars: Vec<&EnvVar> = state
        .env_vars
        .values()
        .filter(|v| v.user_id == user_id && v.scope == scope)
        .collect();
    vars.sort_by(|a, b| a.key.cmp(&b.key));
    vars
}

fn find_by_key<'a>(
    state: &'a relay_storage::MaterializedState,
    user_id: &str,
    key: &str,
) -> Option<&'a EnvVar> {
    state.env_vars.values().find(|v| v.user_id == user_id && v.key == key)
}

fn owned_user_var(
    state: &relay_storage::MaterializedState,
    user_id: &str,
    env_var_id: &EnvVarId,
) -> Result<EnvVar, ControlError> {
    match state.env_vars.get(env_var_id) {
        Some(var) if var.user_id == user_id && var.scope == Scope::User => Ok(var.clone()),
        _ => Err(ControlError::not_found(format!("Env var not found: {env_var_id}"))),
    }
}

fn system_var(
    state: &relay_storage::MaterializedState,
    env_var_id: &EnvVarId,
) -> Result<EnvVar, ControlError> {
    match state.env_vars.get(env_var_id) {
        Some(var) if var.user_id == SYSTEM_USER_ID && var.scope == Scope::System => {
            Ok(var.clone())
        }
        _ => Err(ControlError::not_found(format!("System env var not found: {env_var_id}"))),
    }
}

#[cfg(test)]
#[path = "env_vars_tests.rs"]
mod tests;
