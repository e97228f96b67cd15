// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill catalog, per-user installs, and the skill-config resolver that
//! hands the dispatcher stageable entries.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{
    validate_component_name, Clock, Event, Scope, SkillId, SkillRecord, UserSkillInstall,
};
use relay_storage::{install_key, MaterializedState};
use relay_wire::{
    InstallView, SkillConfigResolveRequest, SkillCreateRequest, SkillFileSpec, SkillUpdateRequest,
    SkillView,
};
use std::collections::{BTreeMap, HashSet};

impl<C: Clock> Control<C> {
    /// Skills visible to the user: their own plus unshadowed system ones.
    pub fn list_skills(&self, ctx: &RequestCtx) -> Result<Vec<SkillView>, ControlError> {
        Ok(self.store.read(|state| {
            visible_skills(state, &ctx.user_id).into_iter().map(SkillView::from).collect()
        }))
    }

    pub fn get_skill(
        &self,
        ctx: &RequestCtx,
        skill_id: &SkillId,
    ) -> Result<SkillView, ControlError> {
        self.store.read(|state| match state.skills.get(skill_id) {
            Some(skill) if skill.scope == Scope::System || skill.owner_user_id == ctx.user_id => {
                Ok(SkillView::from(skill))
            }
            _ => Err(ControlError::not_found(format!("Skill not found: {skill_id}"))),
        })
    }

    pub fn create_skill(
        &self,
        ctx: &RequestCtx,
        request: SkillCreateRequest,
    ) -> Result<SkillView, ControlError> {
        let name = validate_component_name(&request.name)
            .map_err(|e| ControlError::bad_request(e.to_string()))?
            .to_string();
        let scope = request.scope.unwrap_or(Scope::User);
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            let taken = state.skills.values().any(|s| {
                s.name == name
                    && match scope {
                        Scope::System => s.scope == Scope::System,
                        Scope::User => s.scope == Scope::User && s.owner_user_id == ctx.user_id,
                    }
            });
            if taken {
                return Err(ControlError::conflict(format!("Skill already exists: {name}")));
            }
            let skill = SkillRecord {
                id: SkillId::new(),
                name: name.clone(),
                scope,
                owner_user_id: ctx.user_id.clone(),
                entry: request.entry.clone(),
                source: serde_json::json!({"kind": "manual"}),
                created_at_ms: now,
                updated_at_ms: now,
            };
            let view = SkillView::from(&skill);
            Ok((vec![Event::SkillUpserted { skill }], view))
        })
    }

    pub fn update_skill(
        &self,
        ctx: &RequestCtx,
        skill_id: &SkillId,
        request: SkillUpdateRequest,
    ) -> Result<SkillView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let mut skill = match state.skills.get(skill_id) {
                Some(skill) if skill.scope == Scope::System => {
                    return Err(ControlError::forbidden("Skill modification forbidden"));
                }
                Some(skill) if skill.owner_user_id == ctx.user_id => skill.clone(),
                _ => {
                    return Err(ControlError::not_found(format!("Skill not found: {skill_id}")));
                }
            };
            if let Some(name) = &request.name {
                let name = validate_component_name(name)
                    .map_err(|e| ControlError::bad_request(e.to_string()))?;
                let taken = state
                    .skills
                    .values()
                    .any(|s| s.id != skill.id && s.name == name && s.owner_user_id == ctx.user_id);
                if taken {
                    return Err(ControlError::conflict(format!("Skill already exists: {name}")));
                }
                skill.name = name.to_string();
            }
            if let Some(entry) = &request.entry {
                skill.entry = entry.clone();
            }
            skill.updated_at_ms = now;
            let view = SkillView::from(&skill);
            Ok((vec![Event::SkillUpserted { skill }], view))
        })
    }

    pub fn delete_skill(&self, ctx: &RequestCtx, skill_id: &SkillId) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            match state.skills.get(skill_id) {
                Some(skill) if skill.scope == Scope::System => {
                    Err(ControlError::forbidden("Skill modification forbidden"))
                }
                Some(skill) if skill.owner_user_id == ctx.user_id => {
                    Ok((vec![Event::SkillDeleted { id: skill.id }], ()))
                }
                _ => Err(ControlError::not_found(format!("Skill not found: {skill_id}"))),
            }
        })
    }

    pub fn install_skill(
        &self,
        ctx: &RequestCtx,
        skill_id: &SkillId,
        enabled: bool,
    ) -> Result<InstallView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let visible = state
                .skills
                .get(skill_id)
                .is_some_and(|s| s.scope == Scope::System || s.owner_user_id == ctx.user_id);
            if !visible {
                return Err(ControlError::not_found(format!("Skill not found: {skill_id}")));
            }
            let created_at_ms = state
                .skill_installs
                .get(&install_key(&ctx.user_id, skill_id.as_str()))
                .map(|i| i.created_at_ms)
                .unwrap_or(now);
            let install = UserSkillInstall {
                user_id: ctx.user_id.clone(),
                skill_id: *skill_id,
                enabled,
                created_at_ms,
            };
            let view = InstallView {
                user_id: install.user_id.clone(),
                capability_id: install.skill_id.to_string(),
                enabled,
                created_at_ms,
            };
            Ok((vec![Event::SkillInstallUpserted { install }], view))
        })
    }

    pub fn uninstall_skill(
        &self,
        ctx: &RequestCtx,
        skill_id: &SkillId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            if !state.skill_installs.contains_key(&install_key(&ctx.user_id, skill_id.as_str())) {
                return Err(ControlError::not_found(format!("Skill install not found: {skill_id}")));
            }
            Ok((
                vec![Event::SkillInstallDeleted {
                    user_id: ctx.user_id.clone(),
                    skill_id: *skill_id,
                }],
                (),
            ))
        })
    }

    pub fn list_skill_installs(&self, ctx: &RequestCtx) -> Result<Vec<InstallView>, ControlError> {
        Ok(self.store.read(|state| {
            let mut installs: Vec<&UserSkillInstall> =
                state.skill_installs.values().filter(|i| i.user_id == ctx.user_id).collect();
            installs.sort_by_key(|i| (i.created_at_ms, i.skill_id));
            installs
                .into_iter()
                .map(|i| InstallView {
                    user_id: i.user_id.clone(),
                    capability_id: i.skill_id.to_string(),
                    enabled: i.enabled,
                    created_at_ms: i.created_at_ms,
                })
                .collect()
        }))
    }

    /// Resolve selected skill ids to stageable entries, keyed by skill
    /// name. Unknown or uninstalled ids are skipped silently.
    pub fn resolve_skill_config(
        &self,
        ctx: &RequestCtx,
        request: SkillConfigResolveRequest,
    ) -> Result<BTreeMap<String, SkillFileSpec>, ControlError> {
        if request.skill_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(self.store.read(|state| {
            let installed: HashSet<&str> = state
                .skill_installs
                .values()
                .filter(|i| i.user_id == ctx.user_id)
                .map(|i| i.skill_id.as_str())
                .collect();

            let mut seen = HashSet::new();
            let mut resolved = BTreeMap::new();
            for raw_id in &request.skill_ids {
                let id = raw_id.trim();
                if id.is_empty() || !seen.insert(id) {
                    continue;
                }
                if !installed.contains(id) {
                    continue;
                }
                let Some(skill) = state.skills.get(&SkillId::from_string(id)) else {
                    continue;
                };
                resolved.insert(
                    skill.name.clone(),
                    SkillFileSpec {
                        enabled: true,
                        s3_key: skill.storage_key().map(String::from),
                        is_prefix: skill.is_prefix(),
                    },
                );
            }
            resolved
        }))
    }
}

fn visible_skills<'a>(state: &'a MaterializedState, user_id: &str) -> Vec<&'a SkillRecord> {
    let user_names: HashSet<&str> = state
        .skills
        .values()
        .filter(|s| s.scope == Scope::User && s.owner_user_id == user_id)
        .map(|s| s.name.as_str())
        .collect();

    let mut skills: Vec<&SkillRecord> = state
        .skills
        .values()
        .filter(|s| {
            (s.scope == Scope::User && s.owner_user_id == user_id)
                || (s.scope == Scope::System && !user_names.contains(s.name.as_str()))
        })
        .collect();
    skills.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(a.name.cmp(&b.name)));
    skills
}

#[cfg(test)]
#[path = "skills_tests.rs"]
mod tests;
