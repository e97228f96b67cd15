// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace staging: lay out skills, attachments, slash commands, and
//! persistent instructions under a session's workspace directory.

mod attachments;
mod commands;
mod instructions;
mod skills;

pub use attachments::AttachmentStager;
pub use commands::SlashCommandStager;
pub use instructions::InstructionsStager;
pub use skills::SkillStager;

use crate::error::DispatchError;
use relay_core::validate_component_name;
use std::path::Path;

/// Directory inside the workspace the executor exposes as `~/.claude`.
pub const CLAUDE_DATA_DIR: &str = ".claude_data";

/// Directory for per-run attachments.
pub const INPUTS_DIR: &str = "inputs";

pub(crate) fn component_name(name: &str) -> Result<&str, DispatchError> {
    validate_component_name(name).map_err(|e| DispatchError::workspace(e.to_string()))
}

/// After joining validated components the target must still live under
/// `base`; anything else is a staging bug or a traversal attempt.
pub(crate) fn ensure_under(base: &Path, target: &Path) -> Result<(), DispatchError> {
    if target.starts_with(base) {
        Ok(())
    } else {
        Err(DispatchError::workspace(format!(
            "staged path escapes workspace: {}",
            target.display()
        )))
    }
}
