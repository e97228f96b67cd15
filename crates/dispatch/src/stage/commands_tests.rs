// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

fn workspace() -> (WorkspaceManager, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let workspace = WorkspaceManager::new(dir.path(), true, true).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().unwrap();
    workspace.prepare("u1", "ses-1", "ephemeral", now).unwrap();
    (workspace, dir)
}

#[tokio::test]
async fn writes_one_file_per_command() {
    let (workspace, _dir) = workspace();
    let commands = BTreeMap::from([
        ("deploy".to_string(), "---\ndescription: \"d\"\n---\n\nDeploy.\n".to_string()),
        ("review".to_string(), "Review.\n".to_string()),
    ]);
    let staged = SlashCommandStager
        .stage_commands(&workspace, "u1", "ses-1", &commands)
        .await
        .unwrap();
    assert_eq!(staged, 2);

    let commands_dir =
        workspace.workspace_dir("u1", "ses-1").unwrap().join(".claude_data/commands");
    assert!(commands_dir.join("deploy.md").is_file());
    assert_eq!(std::fs::read_to_string(commands_dir.join("review.md")).unwrap(), "Review.\n");
}

#[tokio::test]
async fn restaging_clears_removed_commands() {
    let (workspace, _dir) = workspace();
    let first = BTreeMap::from([("old".to_string(), "Old.".to_string())]);
    SlashCommandStager.stage_commands(&workspace, "u1", "ses-1", &first).await.unwrap();

    let second = BTreeMap::from([("new".to_string(), "New.".to_string())]);
    SlashCommandStager.stage_commands(&workspace, "u1", "ses-1", &second).await.unwrap();

    let commands_dir =
        workspace.workspace_dir("u1", "ses-1").unwrap().join(".claude_data/commands");
    assert!(!commands_dir.join("old.md").exists());
    assert!(commands_dir.join("new.md").is_file());
}

#[tokio::test]
async fn invalid_command_name_fails() {
    let (workspace, _dir) = workspace();
    let commands = BTreeMap::from([("..".to_string(), "nope".to_string())]);
    let err = SlashCommandStager
        .stage_commands(&workspace, "u1", "ses-1", &commands)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Workspace(_)));
}
