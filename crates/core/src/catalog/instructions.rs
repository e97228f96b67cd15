// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user persistent instructions, staged into the workspace as the
//! user-level CLAUDE.md when enabled and non-empty.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserInstructions {
    pub user_id: String,
    pub enabled: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl UserInstructions {
    /// Whether staging should materialize the file.
    pub fn should_stage(&self) -> bool {
        self.enabled && !self.content.trim().is_empty()
    }
}
