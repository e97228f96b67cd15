// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session workspace directories on local disk.
//!
//! Layout: `<root>/active/<user_id>/<session_id>/{workspace/, logs/,
//! meta.json}`. The agent's working tree lives under `workspace/`;
//! `.claude_data/` inside it is what the executor exposes as user-level
//! config. Archives land under `<root>/archive/<user_id>/<YYYY-MM-DD>/`.

use chrono::{DateTime, SecondsFormat, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory names the stager and exporter both skip.
pub const IGNORE_NAMES: [&str; 15] = [
    ".git",
    ".hg",
    ".svn",
    ".DS_Store",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    "node_modules",
    ".venv",
    "venv",
    ".next",
    "dist",
    "build",
    "__MACOSX",
];

const MAX_TREE_DEPTH: usize = 8;
const MAX_TREE_ENTRIES: usize = 4000;

/// Whether a file/directory name is excluded from staging and export.
pub fn should_skip_name(name: &str, ignore_dot_files: bool) -> bool {
    IGNORE_NAMES.contains(&name) || (ignore_dot_files && name.starts_with('.'))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMeta {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// "active" | "archived" | "deleted"
    pub status: String,
    /// "ephemeral" | "persistent"
    pub container_mode: String,
    pub workspace_path: PathBuf,
}

/// Result of a cleanup sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupStats {
    pub deleted: usize,
    pub archived: usize,
    pub errors: usize,
}

pub struct WorkspaceManager {
    base_dir: PathBuf,
    active_dir: PathBuf,
    archive_dir: PathBuf,
    temp_dir: PathBuf,
    ignore_dot_files: bool,
    archive_enabled: bool,
}

impl WorkspaceManager {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        ignore_dot_files: bool,
        archive_enabled: bool,
    ) -> std::io::Result<Self> {
        let base_dir = workspace_root.into();
        let manager = Self {
            active_dir: base_dir.join("active"),
            archive_dir: base_dir.join("archive"),
            temp_dir: base_dir.join("temp"),
            base_dir,
            ignore_dot_files,
            archive_enabled,
        };
        for dir in [&manager.active_dir, &manager.archive_dir, &manager.temp_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(manager)
    }

    pub fn ignore_dot_files(&self) -> bool {
        self.ignore_dot_files
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    fn session_dir(&self, user_id: &str, session_id: &str) -> PathBuf {
        self.active_dir.join(user_id).join(session_id)
    }

    /// Create (or reuse) the session directory skeleton and return it.
    pub fn prepare(
        &self,
        user_id: &str,
        session_id: &str,
        container_mode: &str,
        now: DateTime<Utc>,
    ) -> std::io::Result<PathBuf> {
        let session_dir = self.session_dir(user_id, session_id);
        let workspace_dir = session_dir.join("workspace");
        fs::create_dir_all(&workspace_dir)?;
        fs::create_dir_all(session_dir.join("logs"))?;

        let meta_file = session_dir.join("meta.json");
        if !meta_file.exists() {
            let meta = WorkspaceMeta {
                session_id: session_id.to_string(),
                user_id: user_id.to_string(),
                created_at: now,
                status: "active".to_string(),
                container_mode: container_mode.to_string(),
                workspace_path: workspace_dir.clone(),
            };
            fs::write(&meta_file, serde_json::to_vec_pretty(&meta)?)?;
        }
        Ok(session_dir)
    }

    /// The agent working tree for a session, if prepared.
    pub fn workspace_dir(&self, user_id: &str, session_id: &str) -> Option<PathBuf> {
        let dir = self.session_dir(user_id, session_id).join("workspace");
        dir.is_dir().then_some(dir)
    }

    /// Find which user owns a session by scanning the active roots.
    pub fn resolve_user_id(&self, session_id: &str) -> Option<String> {
        let entries = fs::read_dir(&self.active_dir).ok()?;
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            if entry.path().join(session_id).exists() {
                return Some(entry.file_name().to_string_lossy().to_string());
            }
        }
        None
    }

    pub fn read_meta(&self, user_id: &str, session_id: &str) -> Option<WorkspaceMeta> {
        let meta_file = self.session_dir(user_id, session_id).join("meta.json");
        let bytes = fs::read(&meta_file).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::error!(path = %meta_file.display(), error = %e, "unreadable meta.json");
                None
            }
        }
    }

    pub fn update_meta_status(
        &self,
        user_id: &str,
        session_id: &str,
        status: &str,
    ) -> std::io::Result<()> {
        if let Some(mut meta) = self.read_meta(user_id, session_id) {
            meta.status = status.to_string();
            let meta_file = self.session_dir(user_id, session_id).join("meta.json");
            fs::write(&meta_file, serde_json::to_vec_pretty(&meta)?)?;
        }
        Ok(())
    }

    /// List workspace files as a UI tree, honoring the ignore rules and
    /// the depth/entry caps. Folders sort before files, names
    /// case-insensitively.
    pub fn list_files(&self, user_id: &str, session_id: &str) -> Vec<Value> {
        let Some(workspace_dir) = self.workspace_dir(user_id, session_id) else {
            return Vec::new();
        };
        let mut budget = MAX_TREE_ENTRIES;
        self.build_tree(&workspace_dir, "", 0, &mut budget)
    }

    fn build_tree(&self, dir: &Path, prefix: &str, depth: usize, budget: &mut usize) -> Vec<Value> {
        if depth > MAX_TREE_DEPTH {
            return Vec::new();
        }
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut entries: Vec<_> = entries.flatten().collect();
        entries.sort_by_key(|e| {
            (e.path().is_file(), e.file_name().to_string_lossy().to_lowercase())
        });

        let mut nodes = Vec::new();
        for entry in entries {
            if *budget == 0 {
                break;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if should_skip_name(&name, self.ignore_dot_files) {
                continue;
            }
            let path = entry.path();
            if path.is_symlink() {
                continue;
            }
            let rel_path = format!("{prefix}/{name}");
            *budget -= 1;

            if path.is_dir() {
                let children = self.build_tree(&path, &rel_path, depth + 1, budget);
                nodes.push(serde_json::json!({
                    "id": rel_path,
                    "name": name,
                    "type": "folder",
                    "path": rel_path,
                    "children": children,
                }));
            } else if path.is_file() {
                let mime = mime_guess::from_path(&name).first_raw();
                nodes.push(serde_json::json!({
                    "id": rel_path,
                    "name": name,
                    "type": "file",
                    "path": rel_path,
                    "mimeType": mime,
                }));
            }
        }
        nodes
    }

    /// Resolve a caller-supplied path to a file inside the workspace.
    /// Returns None for traversal attempts, misses, and non-files.
    pub fn resolve_file(&self, user_id: &str, session_id: &str, file_path: &str) -> Option<PathBuf> {
        let workspace_dir = self.workspace_dir(user_id, session_id)?;
        let clean = file_path.trim().trim_start_matches('/');
        if clean.is_empty() {
            return None;
        }
        let candidate = workspace_dir.join(clean).canonicalize().ok()?;
        let base = workspace_dir.canonicalize().ok()?;
        if !candidate.starts_with(&base) {
            return None;
        }
        candidate.is_file().then_some(candidate)
    }

    /// Tar-gzip the whole session directory into the archive area and
    /// remove the live copy.
    pub fn archive(&self, user_id: &str, session_id: &str, now: DateTime<Utc>) -> std::io::Result<PathBuf> {
        let session_dir = self.session_dir(user_id, session_id);
        if !session_dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("workspace not found: {}", session_dir.display()),
            ));
        }

        let date_dir = self.archive_dir.join(user_id).join(now.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&date_dir)?;
        let archive_file = date_dir.join(format!("{session_id}.tar.gz"));

        let file = fs::File::create(&archive_file)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);
        builder.append_dir_all(session_id, &session_dir)?;
        builder.into_inner()?.finish()?;

        let _ = self.update_meta_status(user_id, session_id, "archived");
        fs::remove_dir_all(&session_dir)?;
        tracing::info!(
            session = session_id,
            archive = %archive_file.display(),
            "workspace archived"
        );
        Ok(archive_file)
    }

    /// Delete a workspace. Persistent sessions are skipped unless
    /// `force`.
    pub fn delete(&self, user_id: &str, session_id: &str, force: bool) -> std::io::Result<bool> {
        if let Some(meta) = self.read_meta(user_id, session_id) {
            if !force && meta.container_mode == "persistent" {
                tracing::warn!(session = session_id, "persistent workspace, skipping delete");
                return Ok(false);
            }
        }
        let session_dir = self.session_dir(user_id, session_id);
        if !session_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&session_dir)?;
        tracing::info!(session = session_id, "workspace deleted");
        Ok(true)
    }

    /// Periodic sweep: delete expired ephemeral sessions, archive (or
    /// delete, when archiving is disabled) expired persistent ones, and
    /// drop directories without readable metadata.
    pub fn cleanup_expired(&self, max_age_hours: u64, now: DateTime<Utc>) -> CleanupStats {
        let mut stats = CleanupStats::default();
        let Ok(users) = fs::read_dir(&self.active_dir) else {
            return stats;
        };
        for user_entry in users.flatten() {
            if !user_entry.path().is_dir() {
                continue;
            }
            let user_id = user_entry.file_name().to_string_lossy().to_string();
            let Ok(sessions) = fs::read_dir(user_entry.path()) else {
                stats.errors += 1;
                continue;
            };
            for session_entry in sessions.flatten() {
                if !session_entry.path().is_dir() {
                    continue;
                }
                let session_id = session_entry.file_name().to_string_lossy().to_string();
                let Some(meta) = self.read_meta(&user_id, &session_id) else {
                    match self.delete(&user_id, &session_id, true) {
                        Ok(true) => stats.deleted += 1,
                        Ok(false) => {}
                        Err(_) => stats.errors += 1,
                    }
                    continue;
                };

                if meta.status != "active" {
                    continue;
                }
                let age = now.signed_duration_since(meta.created_at);
                if age.num_hours() < max_age_hours as i64 {
                    continue;
                }

                if meta.container_mode == "persistent" && self.archive_enabled {
                    match self.archive(&user_id, &session_id, now) {
                        Ok(_) => stats.archived += 1,
                        Err(e) => {
                            tracing::error!(session = %session_id, error = %e, "archive failed");
                            stats.errors += 1;
                        }
                    }
                } else {
                    match self.delete(&user_id, &session_id, meta.container_mode != "persistent") {
                        Ok(true) => stats.deleted += 1,
                        Ok(false) => {}
                        Err(e) => {
                            tracing::error!(session = %session_id, error = %e, "delete failed");
                            stats.errors += 1;
                        }
                    }
                }
            }
        }
        stats
    }

    /// Disk usage summary for observability endpoints. `now` comes from
    /// the caller's clock, like [`WorkspaceManager::cleanup_expired`].
    pub fn disk_usage(&self, now: DateTime<Utc>) -> Value {
        serde_json::json!({
            "base_dir": self.base_dir.display().to_string(),
            "active_bytes": dir_size(&self.active_dir),
            "archive_bytes": dir_size(&self.archive_dir),
            "temp_bytes": dir_size(&self.temp_dir),
            "active_workspaces": count_files_named(&self.active_dir, "meta.json"),
            "generated_at": now.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else { return 0 };
    let mut total = 0u64;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_symlink() {
            continue;
        }
        if path.is_dir() {
            total += dir_size(&path);
        } else if let Ok(meta) = path.metadata() {
            total += meta.len();
        }
    }
    total
}

fn count_files_named(path: &Path, name: &str) -> usize {
    let Ok(entries) = fs::read_dir(path) else { return 0 };
    let mut count = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            count += count_files_named(&path, name);
        } else if entry.file_name() == name {
            count += 1;
        }
    }
    count
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
