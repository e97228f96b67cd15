// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent-instructions staging: the user-level CLAUDE.md inside
//! `workspace/.claude_data/`.

use super::CLAUDE_DATA_DIR;
use crate::error::DispatchError;
use crate::workspace::WorkspaceManager;

pub struct InstructionsStager;

impl InstructionsStager {
    /// Write the file when enabled and non-empty; otherwise remove any
    /// stale copy. Returns whether the file exists afterwards.
    pub async fn stage(
        &self,
        workspace: &WorkspaceManager,
        user_id: &str,
        session_id: &str,
        enabled: bool,
        content: &str,
    ) -> Result<bool, DispatchError> {
        let workspace_dir = workspace
            .workspace_dir(user_id, session_id)
            .ok_or_else(|| DispatchError::workspace("workspace not prepared"))?;
        let claude_root = workspace_dir.join(CLAUDE_DATA_DIR);
        tokio::fs::create_dir_all(&claude_root).await?;
        let target = claude_root.join("CLAUDE.md");

        if enabled && !content.trim().is_empty() {
            let mut text = content.to_string();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            tokio::fs::write(&target, text).await?;
            tracing::info!(session = session_id, bytes = content.len(), "instructions staged");
            return Ok(true);
        }

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "instructions_tests.rs"]
mod tests;
