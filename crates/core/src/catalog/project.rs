// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project records: named repo contexts runs can bind to.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a project.
    pub struct ProjectId("prj-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Env-var key holding the git token, resolved from the user's env map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_token_env_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Project {
    /// Non-empty repo URL, the precondition for default injection.
    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn git_branch(&self) -> Option<&str> {
        self.git_branch.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn git_token_env_key(&self) -> Option<&str> {
        self.git_token_env_key.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

crate::builder! {
    pub struct ProjectBuilder => Project {
        into {
            id: ProjectId = "prj-test",
            user_id: String = "u1",
            name: String = "api",
        }
        set {
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            repo_url: String = None,
            git_branch: String = None,
            git_token_env_key: String = None,
            description: String = None,
        }
    }
}
