// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slash command staging: one rendered markdown file per command under
//! `workspace/.claude_data/commands/`.

use super::{component_name, ensure_under, CLAUDE_DATA_DIR};
use crate::error::DispatchError;
use crate::workspace::WorkspaceManager;
use std::collections::BTreeMap;

pub struct SlashCommandStager;

impl SlashCommandStager {
    /// Write each rendered command; returns how many were staged. The
    /// directory is cleared first so removed commands disappear.
    pub async fn stage_commands(
        &self,
        workspace: &WorkspaceManager,
        user_id: &str,
        session_id: &str,
        commands: &BTreeMap<String, String>,
    ) -> Result<usize, DispatchError> {
        let workspace_dir = workspace
            .workspace_dir(user_id, session_id)
            .ok_or_else(|| DispatchError::workspace("workspace not prepared"))?;
        let commands_dir = workspace_dir.join(CLAUDE_DATA_DIR).join("commands");
        if commands_dir.exists() {
            tokio::fs::remove_dir_all(&commands_dir).await?;
        }
        tokio::fs::create_dir_all(&commands_dir).await?;

        let mut staged = 0usize;
        for (name, markdown) in commands {
            let name = component_name(name)?;
            let target = commands_dir.join(format!("{name}.md"));
            ensure_under(&commands_dir, &target)?;
            tokio::fs::write(&target, markdown).await?;
            staged += 1;
        }
        tracing::info!(session = session_id, staged, "slash commands staged");
        Ok(staged)
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
