// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill staging: download each enabled skill's assets into
//! `workspace/.claude_data/skills/<name>/`.

use super::{component_name, ensure_under, CLAUDE_DATA_DIR};
use crate::blob::BlobStore;
use crate::error::DispatchError;
use crate::resolver::StagedSkill;
use crate::workspace::WorkspaceManager;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub struct SkillStager {
    blob: Arc<dyn BlobStore>,
}

impl SkillStager {
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }

    /// Stage every enabled skill, filling in `local_path`. Returns the
    /// number staged. Disabled skills and entries without a storage key
    /// are passed through untouched.
    pub async fn stage_skills(
        &self,
        workspace: &WorkspaceManager,
        user_id: &str,
        session_id: &str,
        skills: &mut BTreeMap<String, StagedSkill>,
    ) -> Result<usize, DispatchError> {
        if skills.is_empty() {
            return Ok(0);
        }
        let workspace_dir = workspace
            .workspace_dir(user_id, session_id)
            .ok_or_else(|| DispatchError::workspace("workspace not prepared"))?;
        let skills_root = workspace_dir.join(CLAUDE_DATA_DIR).join("skills");
        tokio::fs::create_dir_all(&skills_root).await?;

        let mut staged = 0usize;
        for (name, skill) in skills.iter_mut() {
            let name = component_name(name)?;
            if !skill.enabled {
                continue;
            }
            let Some(key) = skill.s3_key.as_deref().filter(|k| !k.is_empty()) else {
                continue;
            };

            let target_dir = skills_root.join(name);
            ensure_under(&skills_root, &target_dir)?;
            tokio::fs::create_dir_all(&target_dir).await?;

            let result = if skill.is_prefix || key.ends_with('/') {
                self.blob.download_prefix(key, &target_dir).await.map(|_| ())
            } else {
                let filename = Path::new(key)
                    .file_name()
                    .ok_or_else(|| DispatchError::storage(format!("invalid skill key: {key}")))?;
                self.blob.download_file(key, &target_dir.join(filename)).await
            };
            result.map_err(|e| {
                DispatchError::storage(format!("failed to stage skill {name}: {e}"))
            })?;

            skill.local_path = Some(target_dir);
            staged += 1;
        }
        tracing::info!(session = session_id, staged, "skills staged");
        Ok(staged)
    }
}

#[cfg(test)]
#[path = "skills_tests.rs"]
mod tests;
