// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill catalog records and per-user installations.

use super::Scope;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a skill record.
    pub struct SkillId("skl-");
}

/// A skill package. `entry` describes the stored asset
/// (`{"s3_key": ..., "is_prefix": ...}`); `source` records provenance
/// (`{"kind": "manual" | "zip" | "github", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: SkillId,
    pub name: String,
    pub scope: Scope,
    pub owner_user_id: String,
    #[serde(default)]
    pub entry: Value,
    #[serde(default)]
    pub source: Value,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl SkillRecord {
    pub fn storage_key(&self) -> Option<&str> {
        self.entry
            .get("s3_key")
            .or_else(|| self.entry.get("key"))
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
    }

    pub fn is_prefix(&self) -> bool {
        self.entry.get("is_prefix").and_then(Value::as_bool).unwrap_or(false)
            || self.storage_key().is_some_and(|k| k.ends_with('/'))
    }
}

/// Link between a user and a skill. Resurrectable after soft-delete by
/// re-upserting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSkillInstall {
    pub user_id: String,
    pub skill_id: SkillId,
    pub enabled: bool,
    pub created_at_ms: u64,
}

crate::builder! {
    pub struct SkillRecordBuilder => SkillRecord {
        into {
            id: SkillId = "skl-test",
            name: String = "summarize",
            owner_user_id: String = "u1",
        }
        set {
            scope: Scope = Scope::User,
            entry: Value = serde_json::json!({"s3_key": "skills/u1/summarize/v1/"}),
            source: Value = serde_json::json!({"kind": "manual"}),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
    }
}
