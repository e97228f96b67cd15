// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attachment staging: per-run input files under `workspace/inputs/`.
//!
//! Inputs are read-only from the agent's perspective; the prompt
//! instructs it not to modify them. Entries carry either a storage key
//! or inline content.

use super::{component_name, ensure_under, INPUTS_DIR};
use crate::blob::BlobStore;
use crate::error::DispatchError;
use crate::workspace::WorkspaceManager;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

pub struct AttachmentStager {
    blob: Arc<dyn BlobStore>,
}

impl AttachmentStager {
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }

    /// Stage each input entry, returning copies annotated with
    /// `local_path`. Entries without a usable name or source are skipped.
    pub async fn stage_inputs(
        &self,
        workspace: &WorkspaceManager,
        user_id: &str,
        session_id: &str,
        inputs: &[Value],
    ) -> Result<Vec<Value>, DispatchError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let workspace_dir = workspace
            .workspace_dir(user_id, session_id)
            .ok_or_else(|| DispatchError::workspace("workspace not prepared"))?;
        let inputs_dir = workspace_dir.join(INPUTS_DIR);
        tokio::fs::create_dir_all(&inputs_dir).await?;

        let mut staged = Vec::with_capacity(inputs.len());
        for entry in inputs {
            let Some(object) = entry.as_object() else {
                continue;
            };
            let name = object
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| {
                    object
                        .get("s3_key")
                        .or_else(|| object.get("key"))
                        .and_then(Value::as_str)
                        .and_then(|k| Path::new(k).file_name().and_then(|f| f.to_str()))
                })
                .map(str::trim)
                .unwrap_or("");
            let Ok(name) = component_name(name) else {
                tracing::warn!(session = session_id, "skipping input with unusable name");
                continue;
            };

            let destination = inputs_dir.join(name);
            ensure_under(&inputs_dir, &destination)?;

            let key = object
                .get("s3_key")
                .or_else(|| object.get("key"))
                .and_then(Value::as_str)
                .filter(|k| !k.trim().is_empty());
            if let Some(key) = key {
                self.blob.download_file(key, &destination).await.map_err(|e| {
                    DispatchError::storage(format!("failed to stage input {name}: {e}"))
                })?;
            } else if let Some(content) = object.get("content").and_then(Value::as_str) {
                tokio::fs::write(&destination, content).await?;
            } else {
                continue;
            }

            let mut annotated = object.clone();
            annotated.insert(
                "local_path".to_string(),
                Value::String(destination.display().to_string()),
            );
            staged.push(Value::Object(annotated));
        }
        tracing::info!(session = session_id, staged = staged.len(), "inputs staged");
        Ok(staged)
    }
}

#[cfg(test)]
#[path = "attachments_tests.rs"]
mod tests;
