// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sub-agent definitions.
//!
//! Structured agents carry description/prompt/tools/model fields; raw
//! agents are a markdown document whose front-matter `name:` must match
//! the record name (validated at write time).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a sub-agent record.
    pub struct SubAgentId("sub-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubAgentMode {
    #[default]
    Structured,
    Raw,
}

crate::simple_display! {
    SubAgentMode {
        Structured => "structured",
        Raw => "raw",
    }
}

/// Models a sub-agent may pin; anything else resolves to None.
pub const ALLOWED_SUBAGENT_MODELS: [&str; 4] = ["sonnet", "opus", "haiku", "inherit"];

/// Maximum tools kept on a definition.
pub const MAX_SUBAGENT_TOOLS: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAgent {
    pub id: SubAgentId,
    pub user_id: String,
    pub name: String,
    pub enabled: bool,
    pub mode: SubAgentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_markdown: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl SubAgent {
    /// Model constrained to the allowed set.
    pub fn effective_model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .filter(|m| ALLOWED_SUBAGENT_MODELS.contains(m))
    }
}

/// Dedup, trim, and cap a caller-provided tool list.
pub fn normalize_tools(tools: Option<&[String]>) -> Option<Vec<String>> {
    let tools = tools?;
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for tool in tools {
        let t = tool.trim();
        if t.is_empty() || !seen.insert(t.to_string()) {
            continue;
        }
        result.push(t.to_string());
        if result.len() >= MAX_SUBAGENT_TOOLS {
            break;
        }
    }
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

crate::builder! {
    pub struct SubAgentBuilder => SubAgent {
        into {
            id: SubAgentId = "sub-test",
            user_id: String = "u1",
            name: String = "researcher",
        }
        set {
            enabled: bool = true,
            mode: SubAgentMode = SubAgentMode::Structured,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            description: String = Some("finds things".to_string()),
            prompt: String = Some("You research.".to_string()),
            tools: Vec<String> = None,
            model: String = None,
            raw_markdown: String = None,
        }
    }
}

#[cfg(test)]
#[path = "subagent_tests.rs"]
mod tests;
