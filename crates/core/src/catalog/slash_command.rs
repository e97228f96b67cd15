// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slash command definitions and rendering.
//!
//! Structured commands are assembled into YAML front matter + body; raw
//! commands pass through the model-field stripper so user content cannot
//! override the executor's default model.

use crate::markdown::strip_model_from_front_matter;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a slash command record.
    pub struct SlashCommandId("cmd-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashCommandMode {
    #[default]
    Raw,
    Structured,
}

crate::simple_display! {
    SlashCommandMode {
        Raw => "raw",
        Structured => "structured",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashCommand {
    pub id: SlashCommandId,
    pub user_id: String,
    pub name: String,
    pub enabled: bool,
    pub mode: SlashCommandMode,
    /// Structured-mode body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    /// Raw-mode document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_markdown: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl SlashCommand {
    /// Render the command to the markdown staged for the executor.
    pub fn render(&self) -> String {
        match self.mode {
            SlashCommandMode::Structured => self.render_structured(),
            SlashCommandMode::Raw => {
                strip_model_from_front_matter(self.raw_markdown.as_deref().unwrap_or(""))
            }
        }
    }

    fn render_structured(&self) -> String {
        let mut front = Vec::new();
        if let Some(tools) = non_empty(self.allowed_tools.as_deref()) {
            front.push(format!("allowed-tools: {}", json_string(tools)));
        }
        if let Some(desc) = non_empty(self.description.as_deref()) {
            front.push(format!("description: {}", json_string(desc)));
        }
        if let Some(hint) = non_empty(self.argument_hint.as_deref()) {
            front.push(format!("argument-hint: {}", json_string(hint)));
        }

        let body = self.content.as_deref().unwrap_or("").trim_end();
        if front.is_empty() {
            format!("{body}\n")
        } else {
            format!("---\n{}\n---\n\n{body}\n", front.join("\n"))
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// JSON strings are valid YAML scalars and handle escaping reliably.
fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}

crate::builder! {
    pub struct SlashCommandBuilder => SlashCommand {
        into {
            id: SlashCommandId = "cmd-test",
            user_id: String = "u1",
            name: String = "deploy",
        }
        set {
            enabled: bool = true,
            mode: SlashCommandMode = SlashCommandMode::Structured,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            content: String = Some("Run the deploy.".to_string()),
            allowed_tools: String = None,
            description: String = None,
            argument_hint: String = None,
            raw_markdown: String = None,
        }
    }
}

#[cfg(test)]
#[path = "slash_command_tests.rs"]
mod tests;
