// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slash command definitions and the render-to-markdown resolver.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{
    validate_component_name, Clock, Event, SlashCommand, SlashCommandId, SlashCommandMode,
};
use relay_wire::{
    SlashCommandCreateRequest, SlashCommandResolveRequest, SlashCommandUpdateRequest,
    SlashCommandView,
};
use std::collections::BTreeMap;

impl<C: Clock> Control<C> {
    pub fn list_slash_commands(
        &self,
        ctx: &RequestCtx,
    ) -> Result<Vec<SlashCommandView>, ControlError> {
        Ok(self.store.read(|state| {
            let mut commands: Vec<&SlashCommand> =
                state.slash_commands.values().filter(|c| c.user_id == ctx.user_id).collect();
            commands.sort_by(|a, b| {
                b.created_at_ms.cmp(&a.created_at_ms).then(a.name.cmp(&b.name))
            });
            commands.into_iter().map(SlashCommandView::from).collect()
        }))
    }

    pub fn create_slash_command(
        &self,
        ctx: &RequestCtx,
        request: SlashCommandCreateRequest,
    ) -> Result<SlashCommandView, ControlError> {
        let name = validate_component_name(&request.name)
            .map_err(|e| ControlError::bad_request(e.to_string()))?
            .to_string();
        let mode = parse_mode(request.mode.as_deref())?;
        let now = self.epoch_ms();

        self.store.transact(now, |state| {
            let taken = state
                .slash_commands
                .values()
                .any(|c| c.name == name && c.user_id == ctx.user_id);
            if taken {
                return Err(ControlError::conflict(format!(
                    "Slash command already exists: {name}"
                )));
            }

            let command = SlashCommand {
                id: SlashCommandId::new(),
                user_id: ctx.user_id.clone(),
                name: name.clone(),
                enabled: request.enabled,
                mode,
                content: request.content.clone(),
                allowed_tools: request.allowed_tools.clone(),
                description: request.description.clone(),
                argument_hint: request.argument_hint.clone(),
                raw_markdown: request.raw_markdown.clone(),
                created_at_ms: now,
                updated_at_ms: now,
            };
            validate_payload(&command)?;

            let view = SlashCommandView::from(&command);
            Ok((vec![Event::SlashCommandUpserted { command }], view))
        })
    }

    pub fn update_slash_command(
        &self,
        ctx: &RequestCtx,
        command_id: &SlashCommandId,
        request: SlashCommandUpdateRequest,
    ) -> Result<SlashCommandView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let mut command = match state.slash_commands.get(command_id) {
                Some(command) if command.user_id == ctx.user_id => command.clone(),
                _ => {
                    return Err(ControlError::not_found(format!(
                        "Slash command not found: {command_id}"
                    )));
                }
            };

            if let Some(name) = request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                if name != command.name {
                    let name = validate_component_name(name)
                        .map_err(|e| ControlError::bad_request(e.to_string()))?;
                    let taken = state.slash_commands.values().any(|c| {
                        c.id != command.id && c.name == name && c.user_id == ctx.user_id
                    });
                    if taken {
                        return Err(ControlError::conflict(format!(
                            "Slash command already exists: {name}"
                        )));
                    }
                    command.name = name.to_string();
                }
            }

            if let Some(enabled) = request.enabled {
                command.enabled = enabled;
            }
            if let Some(mode) = &request.mode {
                command.mode = parse_mode(Some(mode))?;
            }
            if let Some(content) = &request.content {
                command.content = Some(content.clone());
            }
            if let Some(tools) = &request.allowed_tools {
                command.allowed_tools = Some(tools.clone());
            }
            if let Some(description) = &request.description {
                command.description = Some(description.clone());
            }
            if let Some(hint) = &request.argument_hint {
                command.argument_hint = Some(hint.clone());
            }
            if let Some(raw) = &request.raw_markdown {
                command.raw_markdown = Some(raw.clone());
            }

            validate_payload(&command)?;
            command.updated_at_ms = now;

            let view = SlashCommandView::from(&command);
            Ok((vec![Event::SlashCommandUpserted { command }], view))
        })
    }

    pub fn delete_slash_command(
        &self,
        ctx: &RequestCtx,
        command_id: &SlashCommandId,
    ) -> Result<(), ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            match state.slash_commands.get(command_id) {
                Some(command) if command.user_id == ctx.user_id => {
                    Ok((vec![Event::SlashCommandDeleted { id: command.id }], ()))
                }
                _ => Err(ControlError::not_found(format!(
                    "Slash command not found: {command_id}"
                ))),
            }
        })
    }

    /// Render the user's enabled commands to markdown, optionally
    /// filtered by name. The rendering is where the model-field stripper
    /// runs; no `model:` key survives into staged content.
    pub fn resolve_slash_commands(
        &self,
        ctx: &RequestCtx,
        request: SlashCommandResolveRequest,
    ) -> Result<BTreeMap<String, String>, ControlError> {
        let name_filter: Option<std::collections::HashSet<String>> = {
            let names: std::collections::HashSet<String> = request
                .names
                .iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect();
            if names.is_empty() { None } else { Some(names) }
        };

        Ok(self.store.read(|state| {
            state
                .slash_commands
                .values()
                .filter(|c| c.user_id == ctx.user_id && c.enabled)
                .filter(|c| name_filter.as_ref().is_none_or(|names| names.contains(&c.name)))
                .map(|c| (c.name.clone(), c.render()))
                .collect()
        }))
    }
}

fn parse_mode(mode: Option<&str>) -> Result<SlashCommandMode, ControlError> {
    match mode.map(str::trim).filter(|m| !m.is_empty()).unwrap_or("raw") {
        "raw" => Ok(SlashCommandMode::Raw),
        "structured" => Ok(SlashCommandMode::Structured),
        other => Err(ControlError::bad_request(format!("Invalid slash command mode: {other}"))),
    }
}

fn validate_payload(command: &SlashCommand) -> Result<(), ControlError> {
    match command.mode {
        SlashCommandMode::Structured => {
            if command.content.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(ControlError::bad_request("content cannot be empty"));
            }
        }
        SlashCommandMode::Raw => {
            if command.raw_markdown.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(ControlError::bad_request("raw_markdown cannot be empty"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "slash_commands_tests.rs"]
mod tests;
