// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::blob::FsBlobStore;
use chrono::{TimeZone, Utc};
use serde_json::json;

async fn fixture() -> (WorkspaceManager, AttachmentStager, tempfile::TempDir, tempfile::TempDir) {
    let workspace_dir = tempfile::tempdir().unwrap();
    let blob_dir = tempfile::tempdir().unwrap();
    let workspace = WorkspaceManager::new(workspace_dir.path(), true, true).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().unwrap();
    workspace.prepare("u1", "ses-1", "ephemeral", now).unwrap();

    let blob = FsBlobStore::new(blob_dir.path());
    blob.put_object("uploads/u1/report.csv", b"a,b\n1,2\n".to_vec(), None).await.unwrap();

    (workspace, AttachmentStager::new(Arc::new(blob)), workspace_dir, blob_dir)
}

#[tokio::test]
async fn stages_keyed_and_inline_inputs() {
    let (workspace, stager, _w, _b) = fixture().await;
    let inputs = vec![
        json!({"name": "report.csv", "s3_key": "uploads/u1/report.csv"}),
        json!({"name": "notes.txt", "content": "remember the milk"}),
    ];
    let staged = stager.stage_inputs(&workspace, "u1", "ses-1", &inputs).await.unwrap();
    assert_eq!(staged.len(), 2);

    let inputs_dir = workspace.workspace_dir("u1", "ses-1").unwrap().join("inputs");
    assert_eq!(std::fs::read(inputs_dir.join("report.csv")).unwrap(), b"a,b\n1,2\n");
    assert_eq!(std::fs::read_to_string(inputs_dir.join("notes.txt")).unwrap(), "remember the milk");
    assert!(staged[0]["local_path"].as_str().unwrap().ends_with("inputs/report.csv"));
}

#[tokio::test]
async fn name_falls_back_to_key_basename() {
    let (workspace, stager, _w, _b) = fixture().await;
    let inputs = vec![json!({"s3_key": "uploads/u1/report.csv"})];
    let staged = stager.stage_inputs(&workspace, "u1", "ses-1", &inputs).await.unwrap();
    assert_eq!(staged.len(), 1);
    let inputs_dir = workspace.workspace_dir("u1", "ses-1").unwrap().join("inputs");
    assert!(inputs_dir.join("report.csv").is_file());
}

#[tokio::test]
async fn unusable_entries_are_skipped() {
    let (workspace, stager, _w, _b) = fixture().await;
    let inputs = vec![
        json!("not-an-object"),
        json!({"name": "../escape", "content": "x"}),
        json!({"name": "empty-source.txt"}),
    ];
    let staged = stager.stage_inputs(&workspace, "u1", "ses-1", &inputs).await.unwrap();
    assert!(staged.is_empty());
}
