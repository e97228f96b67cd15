// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sub-agent definitions: CRUD with write-time validation, and the
//! resolver handed to the dispatcher.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::markdown::front_matter_name;
use relay_core::{
    normalize_tools, validate_component_name, Clock, Event, SubAgent, SubAgentId, SubAgentMode,
    ALLOWED_SUBAGENT_MODELS,
};
use relay_wire::{
    SubAgentCreateRequest, SubAgentDefinition, SubAgentResolution, SubAgentResolveRequest,
    SubAgentUpdateRequest, SubAgentView,
};

impl<C: Clock> Control<C> {
    pub fn list_subagents(&self, ctx: &RequestCtx) -> Result<Vec<SubAgentView>, ControlError> {
        Ok(self.store.read(|state| {
            let mut agents: Vec<&SubAgent> =
                state.subagents.values().filter(|a| a.user_id == ctx.user_id).collect();
            agents.sort_by(|a, b| {
                b.created_at_ms.cmp(&a.created_at_ms).then(a.name.cmp(&b.name))
            });
            agents.into_iter().map(SubAgentView::from).collect()
        }))
    }

    pub fn get_subagent(
        &self,
        ctx: &RequestCtx,
        subagent_id: &SubAgentId,
    ) -> Result<SubAgentView, ControlError> {
        self.store.read(|state| match state.subagents.get(subagent_id) {
            Some(agent) if agent.user_id == ctx.user_id => Ok(SubAgentView::from(agent)),
            _ => Err(ControlError::not_found(format!("Subagent not found: {subagent_id}"))),
        })
    }

    pub fn create_subagent(
        &self,
        ctx: &RequestCtx,
        request: SubAgentCreateRequest,
    ) -> Result<SubAgentView, ControlError> {
        let name = validate_component_name(&request.name)
            .map_err(|e| ControlError::bad_request(e.to_string()))?
            .to_string();
        let mode = parse_mode(request.mode.as_deref())?;
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            let taken =
                state.subagents.values().any(|a| a.name == name && a.user_id == ctx.user_id);
            if taken {
                return Err(ControlError::conflict(format!("Subagent already exists: {name}")));
            }

            let mut agent = SubAgent {
                id: SubAgentId::new(),
                user_id: ctx.user_id.clone(),
                name: name.clone(),
                enabled: request.enabled,
                mode,
                description: request.description.clone(),
                prompt: request.prompt.clone(),
                tools: normalize_tools(request.tools.as_deref()),
                model: normalize_model(request.model.as_deref()),
                raw_markdown: request.raw_markdown.clone(),
                created_at_ms: now,
                updated_at_ms: now,
            };
            validate_payload(&mut agent)?;

            let view = SubAgentView::from(&agent);
            Ok((vec![Event::SubAgentUpserted { agent }], view))
        })
    }

    pub fn update_subagent(
        &self,
        ctx: &RequestCtx,
        subagent_id: &SubAgentId,
        request: SubAgentUpdateRequest,
    ) -> Result<SubAgentView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let mut agent = match state.subagents.get(subagent_id) {
                Some(agent) if agent.user_id == ctx.user_id => agent.clone(),
                _ => {
                    return Err(ControlError::not_found(format!(
                        "Subagent not found: {subagent_id}"
                    )));
                }
            };

            if let Some(name) = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                if name != agent.name {
                    let name = validate_component_name(name)
                        .map_err(|e| ControlError::bad_request(e.to_string()))?;
                    let taken = state
                        .subagents
                        .values()
                        .any(|a| a.id != agent.id && a.name == name && a.user_id == ctx.user_id);
                    if taken {
                        return Err(ControlError::conflict(format!(
                            "Subagent already exists: {name}"
                        )));
                    }
                    agent.name = name.to_string();
                }
            }

            if let Some(enabled) = request.enabled {
                agent.enabled = enabled;
            }
            if let Some(mode) = &request.mode {
                agent.mode = parse_mode(Some(mode))?;
            }
            if let Some(description) = &request.description {
                agent.description =
                    Some(description.trim().to_string()).filter(|d| !d.is_empty());
            }
            if let Some(prompt) = &request.prompt {
                agent.prompt = Some(prompt.clone());
            }
            if let Some(tools) = &request.tools {
                agent.tools = normalize_tools(Some(tools));
            }
            if let Some(model) = &request.model {
                agent.model = normalize_model(Some(model));
            }
            if let Some(raw) = &request.raw_markdown {
                agent.raw_markdown = Some(raw.clone());
            }

            validate_payload(&mut agent)?;
            agent.updated_at_ms = now;

            let view = SubAgentView::from(&agent);
            Ok((vec![Event::SubAgentUpserted { agent }], view))
        })
    }

    pub fn delete_subagent(
        &self,
        ctx: &RequestCtx,
        subagent_id: &SubAgentId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            match state.subagents.get(subagent_id) {
                Some(agent) if agent.user_id == ctx.user_id => {
                    Ok((vec![Event::SubAgentDeleted { id: agent.id }], ()))
                }
                _ => Err(ControlError::not_found(format!("Subagent not found: {subagent_id}"))),
            }
        })
    }

    /// Resolve sub-agents for execution. Absent ids mean "all enabled";
    /// an explicit list is used verbatim (order preserved, unknowns
    /// skipped).
    pub fn resolve_subagents(
        &self,
        ctx: &RequestCtx,
        request: SubAgentResolveRequest,
    ) -> Result<SubAgentResolution, ControlError> {
        Ok(self.store.read(|state| {
            let selected: Vec<&SubAgent> = match &request.subagent_ids {
                None => {
                    let mut agents: Vec<&SubAgent> = state
                        .subagents
                        .values()
                        .filter(|a| a.user_id == ctx.user_id && a.enabled)
                        .collect();
                    agents.sort_by_key(|a| (a.created_at_ms, a.id));
                    agents
                }
                Some(ids) => {
                    let mut seen = std::collections::HashSet::new();
                    ids.iter()
                        .map(|id| id.trim())
                        .filter(|id| !id.is_empty() && seen.insert(id.to_string()))
                        .filter_map(|id| state.subagents.get(&SubAgentId::from_string(id)))
                        .filter(|a| a.user_id == ctx.user_id)
                        .collect()
                }
            };

            let mut resolution = SubAgentResolution::default();
            for agent in selected {
                let name = agent.name.trim();
                if name.is_empty() {
                    continue;
                }
                match agent.mode {
                    SubAgentMode::Structured => {
                        let description =
                            agent.description.as_deref().map(str::trim).unwrap_or("");
                        let prompt = agent.prompt.as_deref().map(str::trim).unwrap_or("");
                        if description.is_empty() || prompt.is_empty() {
                            continue;
                        }
                        resolution.structured_agents.insert(
                            name.to_string(),
                            SubAgentDefinition {
                                description: description.to_string(),
                                prompt: prompt.to_string(),
                                tools: agent.tools.clone(),
                                model: agent.effective_model().map(String::from),
                            },
                        );
                    }
                    SubAgentMode::Raw => {
                        let markdown = agent.raw_markdown.as_deref().unwrap_or("");
                        if markdown.trim().is_empty() {
                            continue;
                        }
                        resolution.raw_agents.insert(name.to_string(), markdown.to_string());
                    }
                }
            }
            resolution
        }))
    }
}

fn parse_mode(mode: Option<&str>) -> Result<SubAgentMode, ControlError> {
    match mode.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("structured") {
        "structured" => Ok(SubAgentMode::Structured),
        "raw" => Ok(SubAgentMode::Raw),
        other => Err(ControlError::bad_request(format!("Invalid subagent mode: {other}"))),
    }
}

fn normalize_model(model: Option<&str>) -> Option<String> {
    model
        .map(str::trim)
        .filter(|m| ALLOWED_SUBAGENT_MODELS.contains(m))
        .map(String::from)
}

/// Mode-dependent payload validation. Raw agents must carry front matter
/// whose `name:` matches the record; structured agents need description
/// and prompt, and drop any stale raw document (and vice versa).
fn validate_payload(agent: &mut SubAgent) -> Result<(), ControlError> {
    match agent.mode {
        SubAgentMode::Structured => {
            if agent.description.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(ControlError::bad_request("description cannot be empty"));
            }
            if agent.prompt.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(ControlError::bad_request("prompt cannot be empty"));
            }
            agent.raw_markdown = None;
        }
        SubAgentMode::Raw => {
            let markdown = agent.raw_markdown.as_deref().unwrap_or("");
            if markdown.trim().is_empty() {
                return Err(ControlError::bad_request("raw_markdown cannot be empty"));
            }
            let extracted = front_matter_name(markdown).ok_or_else(|| {
                ControlError::bad_request("raw_markdown must include YAML front matter with name")
            })?;
            if extracted.trim() != agent.name {
                return Err(ControlError::bad_request(format!(
                    "raw_markdown name mismatch: {} != {}",
                    extracted, agent.name
                )));
            }
            agent.prompt = None;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "subagents_tests.rs"]
mod tests;
