// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};

fn workspace() -> (WorkspaceManager, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let workspace = WorkspaceManager::new(dir.path(), true, true).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().unwrap();
    workspace.prepare("u1", "ses-1", "ephemeral", now).unwrap();
    (workspace, dir)
}

fn claude_md_path(workspace: &WorkspaceManager) -> std::path::PathBuf {
    workspace.workspace_dir("u1", "ses-1").unwrap().join(".claude_data/CLAUDE.md")
}

#[tokio::test]
async fn enabled_content_is_written_with_trailing_newline() {
    let (workspace, _dir) = workspace();
    let written = InstructionsStager
        .stage(&workspace, "u1", "ses-1", true, "Always be concise.")
        .await
        .unwrap();
    assert!(written);
    assert_eq!(
        std::fs::read_to_string(claude_md_path(&workspace)).unwrap(),
        "Always be concise.\n"
    );
}

#[tokio::test]
async fn disabled_removes_stale_file() {
    let (workspace, _dir) = workspace();
    InstructionsStager.stage(&workspace, "u1", "ses-1", true, "old").await.unwrap();
    let written = InstructionsStager.stage(&workspace, "u1", "ses-1", false, "old").await.unwrap();
    assert!(!written);
    assert!(!claude_md_path(&workspace).exists());
}

#[tokio::test]
async fn empty_content_counts_as_disabled() {
    let (workspace, _dir) = workspace();
    let written =
        InstructionsStager.stage(&workspace, "u1", "ses-1", true, "   \n").await.unwrap();
    assert!(!written);
    assert!(!claude_md_path(&workspace).exists());
}
