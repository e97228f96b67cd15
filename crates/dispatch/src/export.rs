// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace export: after a session reaches a terminal status, upload
//! every workspace file, a manifest, and a tar.gz archive to the object
//! store.

use crate::blob::BlobStore;
use crate::error::DispatchError;
use crate::workspace::{should_skip_name, WorkspaceManager};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use relay_core::Clock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
struct ManifestEntry {
    path: String,
    key: String,
    size: u64,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    status: String,
    last_modified: String,
}

/// Where the export landed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub files_prefix: String,
    pub manifest_key: String,
    pub archive_key: String,
    pub uploaded_files: usize,
}

pub struct WorkspaceExporter<C: Clock> {
    blob: Arc<dyn BlobStore>,
    clock: C,
}

impl<C: Clock> WorkspaceExporter<C> {
    pub fn new(blob: Arc<dyn BlobStore>, clock: C) -> Self {
        Self { blob, clock }
    }

    /// Export a session's workspace. Object layout:
    /// `workspaces/<user>/<session>/{files/<rel>, manifest.json,
    /// archive.tar.gz}`.
    pub async fn export(
        &self,
        workspace: &WorkspaceManager,
        session_id: &str,
    ) -> Result<ExportResult, DispatchError> {
        let user_id = workspace
            .resolve_user_id(session_id)
            .ok_or_else(|| DispatchError::workspace("unable to resolve user_id for session"))?;
        let workspace_dir = workspace
            .workspace_dir(&user_id, session_id)
            .ok_or_else(|| DispatchError::workspace("workspace directory not found"))?;

        let prefix = format!("workspaces/{user_id}/{session_id}");
        let files_prefix = format!("{prefix}/files");
        let manifest_key = format!("{prefix}/manifest.json");
        let archive_key = format!("{prefix}/archive.tar.gz");

        let ignore_dot = workspace.ignore_dot_files();
        let files = collect_files(&workspace_dir, ignore_dot);

        let mut entries = Vec::with_capacity(files.len());
        for file in &files {
            let rel = file
                .strip_prefix(&workspace_dir)
                .map_err(|_| DispatchError::workspace("file escaped workspace during export"))?
                .to_string_lossy()
                .replace('\\', "/");
            let key = format!("{files_prefix}/{rel}");
            let mime = mime_guess::from_path(file).first_raw();

            self.blob
                .upload_file(file, &key, mime)
                .await
                .map_err(|e| DispatchError::storage(format!("upload failed for {rel}: {e}")))?;

            let metadata = tokio::fs::metadata(file).await?;
            entries.push(ManifestEntry {
                path: rel,
                key,
                size: metadata.len(),
                mime_type: mime.map(String::from),
                status: "uploaded".to_string(),
                last_modified: modified_rfc3339(&metadata),
            });
        }

        let manifest = serde_json::json!({
            "version": 1,
            "generated_at": self.clock.now_utc().to_rfc3339_opts(SecondsFormat::Secs, true),
            "files": entries,
        });
        let manifest_body = serde_json::to_vec(&manifest)
            .map_err(|e| DispatchError::storage(format!("manifest encode failed: {e}")))?;
        self.blob
            .put_object(&manifest_key, manifest_body, Some("application/json"))
            .await
            .map_err(|e| DispatchError::storage(format!("manifest upload failed: {e}")))?;

        let archive_path =
            create_archive(workspace.temp_dir(), &workspace_dir, session_id, ignore_dot)?;
        let upload = self
            .blob
            .upload_file(&archive_path, &archive_key, Some("application/gzip"))
            .await
            .map_err(|e| DispatchError::storage(format!("archive upload failed: {e}")));
        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            tracing::warn!(path = %archive_path.display(), error = %e, "failed to clean archive temp file");
        }
        upload?;

        tracing::info!(
            session = session_id,
            files = entries.len(),
            "workspace exported"
        );
        Ok(ExportResult {
            files_prefix,
            manifest_key,
            archive_key,
            uploaded_files: entries.len(),
        })
    }
}

/// Walk the workspace respecting the shared ignore set; symlinks are
/// never followed.
fn collect_files(workspace_dir: &Path, ignore_dot: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![workspace_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut entries: Vec<_> = entries.flatten().collect();
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().to_string();
            if should_skip_name(&name, ignore_dot) {
                continue;
            }
            let path = entry.path();
            if path.is_symlink() {
                continue;
            }
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

/// Tar-gzip the workspace under arcname `workspace`, applying the same
/// ignore rules entry by entry.
fn create_archive(
    temp_dir: &Path,
    workspace_dir: &Path,
    session_id: &str,
    ignore_dot: bool,
) -> Result<PathBuf, DispatchError> {
    std::fs::create_dir_all(temp_dir)?;
    let archive_path = temp_dir.join(format!("{session_id}.tar.gz"));

    let file = std::fs::File::create(&archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    for path in collect_files(workspace_dir, ignore_dot) {
        let rel = path
            .strip_prefix(workspace_dir)
            .map_err(|_| DispatchError::workspace("file escaped workspace during archive"))?;
        builder.append_path_with_name(&path, Path::new("workspace").join(rel))?;
    }
    builder.into_inner()?.finish()?;
    Ok(archive_path)
}

fn modified_rfc3339(metadata: &std::fs::Metadata) -> String {
    let modified: DateTime<Utc> = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| Utc.timestamp_millis_opt(d.as_millis() as i64).single().unwrap_or_default())
        .unwrap_or_default();
    modified.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
