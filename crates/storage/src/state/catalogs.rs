// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability catalog event handlers. Creates carry whole records, so
//! these are straight upserts and removals.

use super::{install_key, MaterializedState};
use relay_core::Event;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::ScheduledTaskUpserted { task } => {
            state.scheduled_tasks.insert(task.id, task.clone());
        }
        Event::ScheduledTaskDeleted { id } => {
            state.scheduled_tasks.remove(id);
        }
        Event::ScheduledTaskRunMirrored { id, run_id, status, error } => {
            if let Some(task) = state.scheduled_tasks.get_mut(id) {
                task.mirror_run(*run_id, *status, error.clone());
            }
        }

        Event::EnvVarUpserted { var } => {
            state.env_vars.insert(var.id, var.clone());
        }
        Event::EnvVarDeleted { id } => {
            state.env_vars.remove(id);
        }

        Event::McpServerUpserted { server } => {
            state.mcp_servers.insert(server.id, server.clone());
        }
        Event::McpServerDeleted { id } => {
            state.mcp_servers.remove(id);
            state.mcp_installs.retain(|_, install| install.server_id != *id);
        }
        Event::McpInstallUpserted { install } => {
            state
                .mcp_installs
                .insert(install_key(&install.user_id, install.server_id.as_str()), install.clone());
        }
        Event::McpInstallDeleted { user_id, server_id } => {
            state.mcp_installs.remove(&install_key(user_id, server_id.as_str()));
        }

        Event::SkillUpserted { skill } => {
            state.skills.insert(skill.id, skill.clone());
        }
        Event::SkillDeleted { id } => {
            state.skills.remove(id);
            state.skill_installs.retain(|_, install| install.skill_id != *id);
        }
        Event::SkillInstallUpserted { install } => {
            state
                .skill_installs
                .insert(install_key(&install.user_id, install.skill_id.as_str()), install.clone());
        }
        Event::SkillInstallDeleted { user_id, skill_id } => {
            state.skill_installs.remove(&install_key(user_id, skill_id.as_str()));
        }

        Event::PluginUpserted { plugin } => {
            state.plugins.insert(plugin.id, plugin.clone());
        }
        Event::PluginDeleted { id } => {
            state.plugins.remove(id);
            state.plugin_installs.retain(|_, install| install.plugin_id != *id);
        }
        Event::PluginInstallUpserted { install } => {
            state
                .plugin_installs
                .insert(install_key(&install.user_id, install.plugin_id.as_str()), install.clone());
        }
        Event::PluginInstallDeleted { user_id, plugin_id } => {
            state.plugin_installs.remove(&install_key(user_id, plugin_id.as_str()));
        }

        Event::SubAgentUpserted { agent } => {
            state.subagents.insert(agent.id, agent.clone());
        }
        Event::SubAgentDeleted { id } => {
            state.subagents.remove(id);
        }

        Event::SlashCommandUpserted { command } => {
            state.slash_commands.insert(command.id, command.clone());
        }
        Event::SlashCommandDeleted { id } => {
            state.slash_commands.remove(id);
        }

        Event::ProjectUpserted { project } => {
            state.projects.insert(project.id, project.clone());
        }
        Event::ProjectDeleted { id } => {
            state.projects.remove(id);
        }

        Event::InstructionsSet { record } => {
            state.instructions.insert(record.user_id.clone(), record.clone());
        }

        _ => {}
    }
}
